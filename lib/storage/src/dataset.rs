use crate::csv_error;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use studysim_core::{Error, Record, RecordId, Result};
use tracing::info;

/// Cell values read as missing, besides empty cells
pub fn default_missing_markers() -> Vec<String> {
    [
        "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>", "-nan", "-NaN",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// How to read the study table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetOptions {
    pub id_column: String,
    pub abstract_column: String,
    pub missing_markers: Vec<String>,
    /// Fail when the header has no abstract column
    #[serde(default)]
    pub require_abstract: bool,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            id_column: "ID".to_string(),
            abstract_column: "Abstract".to_string(),
            missing_markers: default_missing_markers(),
            require_abstract: false,
        }
    }
}

impl DatasetOptions {
    fn is_missing(&self, cell: &str) -> bool {
        let cell = cell.trim();
        cell.is_empty() || self.missing_markers.iter().any(|m| m == cell)
    }
}

/// Load every row of a CSV study table.
///
/// Missing or zero-byte files, a header without the id column (or without
/// the abstract column when `require_abstract` is set), a table
/// without rows, unparsable ids and duplicate ids are all fatal.
pub fn load_dataset<P: AsRef<Path>>(path: P, options: &DatasetOptions) -> Result<Vec<Record>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    if std::fs::metadata(path)?.len() == 0 {
        return Err(Error::EmptyFile(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let id_index = headers
        .iter()
        .position(|h| h == options.id_column)
        .ok_or_else(|| Error::MissingColumn {
            column: options.id_column.clone(),
            path: path.to_path_buf(),
        })?;
    let abstract_index = headers.iter().position(|h| h == options.abstract_column);
    if abstract_index.is_none() && options.require_abstract {
        return Err(Error::MissingColumn {
            column: options.abstract_column.clone(),
            path: path.to_path_buf(),
        });
    }

    let mut records = Vec::new();
    let mut seen = AHashSet::new();

    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let line = row.position().map_or(0, |p| p.line());

        let raw_id = row.get(id_index).unwrap_or_default();
        let id: RecordId = raw_id.parse().map_err(|_| Error::InvalidId {
            line,
            value: raw_id.to_string(),
        })?;
        if !seen.insert(id) {
            return Err(Error::DuplicateId(id.get()));
        }

        let cell = |index: usize| -> Option<String> {
            row.get(index)
                .filter(|v| !options.is_missing(v))
                .map(str::to_string)
        };

        let mut record = Record::new(id, abstract_index.and_then(|i| cell(i)));
        for (index, header) in headers.iter().enumerate() {
            if index == id_index || Some(index) == abstract_index {
                continue;
            }
            record.set_field(header, cell(index));
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(Error::EmptyFile(path.to_path_buf()));
    }

    info!(path = %path.display(), records = records.len(), "Dataset loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_dataset() {
        let file = write_csv(
            "ID,Location,Interaction_PANEL_Hands-Free,Abstract\n\
             1,\"Head, Ear\",Yes,First abstract\n\
             2,N/A,,Second abstract\n\
             3.0,Hand,Partly,\n",
        );
        let records = load_dataset(file.path(), &DatasetOptions::default()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, RecordId(1));
        assert_eq!(records[0].get("Location"), Some("Head, Ear"));
        assert_eq!(records[0].abstract_text.as_deref(), Some("First abstract"));
        assert_eq!(records[1].get("Location"), None);
        assert!(records[1].has_column("Location"));
        assert_eq!(records[1].get("Interaction_PANEL_Hands-Free"), None);
        assert_eq!(records[2].id, RecordId(3));
        assert_eq!(records[2].abstract_text, None);
        assert!(!records[0].has_column("ID"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = load_dataset("/nonexistent/data.csv", &DatasetOptions::default());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_empty_file_is_fatal() {
        let file = write_csv("");
        assert!(matches!(
            load_dataset(file.path(), &DatasetOptions::default()),
            Err(Error::EmptyFile(_))
        ));

        let header_only = write_csv("ID,Abstract\n");
        assert!(matches!(
            load_dataset(header_only.path(), &DatasetOptions::default()),
            Err(Error::EmptyFile(_))
        ));
    }

    #[test]
    fn test_missing_id_column() {
        let file = write_csv("Key,Abstract\n1,x\n");
        assert!(matches!(
            load_dataset(file.path(), &DatasetOptions::default()),
            Err(Error::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_missing_abstract_column() {
        let file = write_csv("ID,Abstrct\n1,hello\n2,world\n");
        let options = DatasetOptions {
            require_abstract: true,
            ..DatasetOptions::default()
        };
        assert!(matches!(
            load_dataset(file.path(), &options),
            Err(Error::MissingColumn { column, .. }) if column == "Abstract"
        ));

        // features only: the abstract column is optional
        let records = load_dataset(file.path(), &DatasetOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].abstract_text, None);
    }

    #[test]
    fn test_invalid_and_duplicate_ids() {
        let bad = write_csv("ID,Abstract\nabc,x\n");
        assert!(matches!(
            load_dataset(bad.path(), &DatasetOptions::default()),
            Err(Error::InvalidId { line: 2, .. })
        ));

        let dup = write_csv("ID,Abstract\n1,x\n1,y\n");
        assert!(matches!(
            load_dataset(dup.path(), &DatasetOptions::default()),
            Err(Error::DuplicateId(1))
        ));
    }

    #[test]
    fn test_custom_missing_markers() {
        let file = write_csv("ID,Gesture\n1,unknown\n2,Tap\n");
        let options = DatasetOptions {
            missing_markers: vec!["unknown".to_string()],
            ..DatasetOptions::default()
        };
        let records = load_dataset(file.path(), &options).unwrap();
        assert_eq!(records[0].get("Gesture"), None);
        assert_eq!(records[1].get("Gesture"), Some("Tap"));
    }
}

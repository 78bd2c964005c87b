use crate::{atomic_write, csv_error};
use std::path::Path;
use studysim_core::{Error, RecordId, Result, SimilarityMatrix};
use tracing::info;

/// Write `matrix` as a labelled CSV: header `,id1,id2,...`, one row per id,
/// missing cells left empty.
pub fn write_matrix<P: AsRef<Path>>(path: P, matrix: &SimilarityMatrix) -> Result<()> {
    let path = path.as_ref();
    atomic_write(path, |writer| {
        let mut header = Vec::with_capacity(matrix.len() + 1);
        header.push(String::new());
        header.extend(matrix.ids().iter().map(RecordId::to_string));
        writer.write_record(&header).map_err(csv_error)?;

        for (i, id) in matrix.ids().iter().enumerate() {
            let mut row = Vec::with_capacity(matrix.len() + 1);
            row.push(id.to_string());
            row.extend(
                matrix
                    .row(i)
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&row).map_err(csv_error)?;
        }
        Ok(())
    })?;

    info!(path = %path.display(), records = matrix.len(), "Similarity matrix written");
    Ok(())
}

/// Read a matrix written by [`write_matrix`]
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<SimilarityMatrix> {
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

    let parse_id = |raw: &str, line: u64| -> Result<RecordId> {
        raw.parse().map_err(|_| Error::InvalidId {
            line,
            value: raw.to_string(),
        })
    };
    let ids = headers
        .iter()
        .skip(1)
        .map(|h| parse_id(h, 1))
        .collect::<Result<Vec<_>>>()?;

    let mut matrix = SimilarityMatrix::zeros(ids)?;
    let n = matrix.len();
    let mut rows = 0;

    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let line = row.position().map_or(0, |p| p.line());
        if rows >= n || row.len() != n + 1 {
            return Err(Error::Shape(format!(
                "line {line}: expected {n} values in a {n}x{n} matrix"
            )));
        }

        let id = parse_id(row.get(0).unwrap_or_default(), line)?;
        if id != matrix.ids()[rows] {
            return Err(Error::Shape(format!(
                "line {line}: row id {id} does not match column id {}",
                matrix.ids()[rows]
            )));
        }

        for (j, cell) in row.iter().skip(1).enumerate() {
            let cell = cell.trim();
            let value = if cell.is_empty() {
                None
            } else {
                Some(cell.parse::<f64>().map_err(|_| {
                    Error::Csv(format!("line {line}: invalid number {cell:?}"))
                })?)
            };

            // the lower triangle was filled from earlier rows
            if j < rows {
                if matrix.get(rows, j) != value {
                    return Err(Error::Shape(format!(
                        "line {line}: matrix is not symmetric at column {}",
                        matrix.ids()[j]
                    )));
                }
            } else {
                matrix.set_pair(rows, j, value);
            }
        }
        rows += 1;
    }

    if rows != n {
        return Err(Error::Shape(format!("expected {n} rows, found {rows}")));
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SimilarityMatrix {
        let mut m = SimilarityMatrix::zeros(vec![RecordId(3), RecordId(1), RecordId(7)]).unwrap();
        m.set_pair(0, 1, Some(0.5));
        m.set_pair(0, 2, Some(-1.25));
        m.set_pair(1, 2, None);
        m.set_diagonal(None);
        m
    }

    #[test]
    fn test_write_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("matrix.csv");
        write_matrix(&path, &sample()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ",3,1,7");
        assert_eq!(lines[1], "3,,0.5,-1.25");
        assert_eq!(lines[2], "1,0.5,,");
        assert_eq!(lines[3], "7,-1.25,,");
    }

    #[test]
    fn test_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matrix.csv");
        let original = sample();
        write_matrix(&path, &original).unwrap();

        let loaded = read_matrix(&path).unwrap();
        assert_eq!(loaded.ids(), original.ids());
        assert_eq!(loaded.get_by_id(RecordId(3), RecordId(7)), Some(-1.25));
        assert_eq!(loaded.get(1, 2), None);
        assert_eq!(loaded.get(0, 0), None);
    }

    #[test]
    fn test_overwrite_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matrix.csv");
        write_matrix(&path, &sample()).unwrap();

        let mut small = SimilarityMatrix::zeros(vec![RecordId(1)]).unwrap();
        small.set_diagonal(Some(1.0));
        write_matrix(&path, &small).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), ",1\n1,1\n");
    }

    #[test]
    fn test_read_missing_or_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matrix.csv");
        assert!(matches!(read_matrix(&path), Err(Error::NotFound(_))));

        std::fs::write(&path, "").unwrap();
        assert!(matches!(read_matrix(&path), Err(Error::EmptyFile(_))));
    }

    #[test]
    fn test_read_rejects_bad_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, ",1,2\n1,1,0.5\n").unwrap();
        assert!(matches!(read_matrix(&path), Err(Error::Shape(_))));

        std::fs::write(&path, ",1,2\n2,1,0.5\n1,0.5,1\n").unwrap();
        assert!(matches!(read_matrix(&path), Err(Error::Shape(_))));

        std::fs::write(&path, ",1,2\n1,1,0.5\n2,0.25,1\n").unwrap();
        assert!(matches!(read_matrix(&path), Err(Error::Shape(_))));
    }
}

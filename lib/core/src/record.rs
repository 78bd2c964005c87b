use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a study record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(id)
    }
}

impl FromStr for RecordId {
    type Err = ();

    /// Accepts plain integers (`"12"`) and integral float renderings (`"12.0"`)
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u64>() {
            return Ok(RecordId(id));
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
                Ok(RecordId(v as u64))
            }
            _ => Err(()),
        }
    }
}

/// One study row. Missing cells are stored as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    /// Abstract text, `None` when the cell was missing
    pub abstract_text: Option<String>,
    fields: AHashMap<String, Option<String>>,
}

impl Record {
    #[must_use]
    pub fn new(id: RecordId, abstract_text: Option<String>) -> Self {
        Self {
            id,
            abstract_text,
            fields: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, column: impl Into<String>, value: Option<&str>) -> Self {
        self.set_field(column, value.map(str::to_string));
        self
    }

    pub fn set_field(&mut self, column: impl Into<String>, value: Option<String>) {
        self.fields.insert(column.into(), value);
    }

    /// Whether the column exists on this record at all (missing or not)
    #[inline]
    pub fn has_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Cell value, `None` if the column is absent or the cell is missing
    #[inline]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).and_then(|v| v.as_deref())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

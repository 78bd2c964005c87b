//! Column schema definitions
//!
//! Declares which dataset columns take part in similarity and how each one
//! is transformed. Column roles are configuration; nothing is inferred from
//! column names at runtime.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Role of a scored column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Single token from the ordinal vocabulary (low/medium/high, yes/no/partly)
    Ordinal,
    /// Single value looked up in an exact-match table
    ExactMatch,
    /// Count-like number, log1p + min-max scaled
    LogNumeric,
    /// Comma separated tokens compared by set overlap
    MultiValue,
}

/// Column schema for the feature-similarity pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSchema {
    /// Identifier column, never scored
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Abstract text column, used for embeddings only
    #[serde(default = "default_abstract_column")]
    pub abstract_column: String,

    #[serde(default)]
    pub ordinal: Vec<String>,

    #[serde(default)]
    pub exact_match: Vec<ExactMatchColumn>,

    #[serde(default)]
    pub log_numeric: Vec<String>,

    #[serde(default)]
    pub multi_value: Vec<String>,

    /// Columns known to exist but deliberately left out (links, authors, ...)
    #[serde(default)]
    pub excluded: Vec<String>,

    /// Score ordinal and exact-match columns alongside the log-numeric ones.
    /// `false` only scores log-numeric and multi-value columns.
    #[serde(default = "default_true")]
    pub score_ordinal_columns: bool,
}

fn default_id_column() -> String {
    "ID".to_string()
}

fn default_abstract_column() -> String {
    "Abstract".to_string()
}

fn default_true() -> bool {
    true
}

/// A column transformed through an exact-match lookup table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExactMatchColumn {
    pub name: String,
    #[serde(default = "default_exact_values")]
    pub values: Vec<ExactValue>,
}

/// One entry of an exact-match table; `score: null` maps to missing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExactValue {
    pub value: String,
    pub score: Option<f64>,
}

impl ExactValue {
    pub fn new(value: &str, score: Option<f64>) -> Self {
        Self {
            value: value.to_string(),
            score,
        }
    }
}

fn default_exact_values() -> Vec<ExactValue> {
    vec![
        ExactValue::new("Yes", Some(1.0)),
        ExactValue::new("Yes (Performance Loss)", Some(0.5)),
        ExactValue::new("No", Some(0.0)),
        ExactValue::new("N/A", None),
    ]
}

impl ExactMatchColumn {
    /// Exact-match column with the default Yes / Yes (Performance Loss) / No / N/A table
    pub fn with_default_values(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: default_exact_values(),
        }
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnSchema {
    /// The earable interaction study schema
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            abstract_column: default_abstract_column(),
            ordinal: names(&[
                "Sensing_PANEL_No Additional Sensing",
                "Interaction_PANEL_Hands-Free",
                "Interaction_PANEL_Eyes-Free",
                "Interaction_PANEL_Adaptation of the Interaction Detection Algorithm to User",
                "Interaction_PANEL_Discreetness of Interaction Techniques",
                "Interaction_PANEL_Social Acceptability of Interaction Techniques",
                "Interaction_PANEL_Accuracy of Interaction Recognition",
                "Interaction_PANEL_Robustness of Interaction Detection",
                "Study_PANEL_Elicitation Study",
                "Study_PANEL_Usability Evaluations",
                "Study_PANEL_Cognitive Ease Evaluations",
                "Study_PANEL_Discreetness of Interactions Evaluations",
                "Study_PANEL_Social Acceptability of Interactions Evaluations",
                "Study_PANEL_Accuracy of Interactions Evaluations",
                "Study_PANEL_Alternative Interaction Validity Evaluations",
                "Device_PANEL_Real-Time Processing",
                "Device_PANEL_On-Device Processing",
            ]),
            exact_match: vec![ExactMatchColumn::with_default_values(
                "Interaction_PANEL_Possible on One Ear",
            )],
            log_numeric: names(&["Interaction_PANEL_Number of Selected Gestures"]),
            multi_value: names(&[
                "Location",
                "Input Body Part",
                "Gesture",
                "Sensing_PANEL_Sensors",
                "Interaction_PANEL_Resolution",
                "Study_PANEL_Evaluation of Different Conditions (User-Related)",
                "Study_PANEL_Evaluation of Different Conditions (Environment-Related)",
                "Study_PANEL_Evaluation of Different Settings",
                "Device_PANEL_Earphone Type",
                "Device_PANEL_Development Stage",
                "Motivations_PANEL_Motivations",
                "Applications_PANEL_Intended Applications",
                "Keywords",
            ]),
            excluded: names(&["Main Author", "Study Link", "Year"]),
            score_ordinal_columns: true,
        }
    }
}

impl ColumnSchema {
    /// Schema with no scored columns, to be filled by the caller
    pub fn empty() -> Self {
        Self {
            id_column: default_id_column(),
            abstract_column: default_abstract_column(),
            ordinal: Vec::new(),
            exact_match: Vec::new(),
            log_numeric: Vec::new(),
            multi_value: Vec::new(),
            excluded: Vec::new(),
            score_ordinal_columns: true,
        }
    }

    /// Every classified column with its role, in declaration order
    pub fn columns(&self) -> Vec<(&str, ColumnRole)> {
        let mut columns = Vec::new();
        columns.extend(self.ordinal.iter().map(|c| (c.as_str(), ColumnRole::Ordinal)));
        columns.extend(
            self.exact_match
                .iter()
                .map(|c| (c.name.as_str(), ColumnRole::ExactMatch)),
        );
        columns.extend(self.log_numeric.iter().map(|c| (c.as_str(), ColumnRole::LogNumeric)));
        columns.extend(self.multi_value.iter().map(|c| (c.as_str(), ColumnRole::MultiValue)));
        columns
    }

    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        self.columns()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, role)| role)
    }

    /// Validate the schema
    /// - at least one scored column
    /// - no column classified twice
    /// - identifier and abstract columns are never scored
    /// - excluded columns are not classified
    /// - exact-match scores lie in [0, 1]
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.log_numeric.is_empty()
            && self.multi_value.is_empty()
            && (!self.score_ordinal_columns
                || (self.ordinal.is_empty() && self.exact_match.is_empty()))
        {
            return Err(SchemaError::EmptySchema);
        }

        let mut seen = HashSet::new();
        for (name, _) in self.columns() {
            if name == self.id_column {
                return Err(SchemaError::IdColumnScored(name.to_string()));
            }
            if name == self.abstract_column {
                return Err(SchemaError::AbstractColumnScored(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateColumn(name.to_string()));
            }
        }

        for column in &self.excluded {
            if let Some(role) = self.role_of(column) {
                return Err(SchemaError::ExcludedColumnScored {
                    column: column.clone(),
                    role,
                });
            }
        }

        for column in &self.exact_match {
            for entry in &column.values {
                if let Some(score) = entry.score {
                    if !(0.0..=1.0).contains(&score) {
                        return Err(SchemaError::ScoreOutOfRange {
                            column: column.name.clone(),
                            value: entry.value.clone(),
                            score,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Errors that can occur during schema validation
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema has no scored columns")]
    EmptySchema,

    #[error("Column '{0}' is classified more than once")]
    DuplicateColumn(String),

    #[error("Identifier column '{0}' cannot be scored")]
    IdColumnScored(String),

    #[error("Abstract column '{0}' cannot be scored")]
    AbstractColumnScored(String),

    #[error("Column '{column}' is excluded but also classified as {role:?}")]
    ExcludedColumnScored { column: String, role: ColumnRole },

    #[error("Exact-match score {score} for '{value}' in column '{column}' is outside [0, 1]")]
    ScoreOutOfRange {
        column: String,
        value: String,
        score: f64,
    },
}

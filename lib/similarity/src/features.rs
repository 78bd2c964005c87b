//! Transformed feature table
//!
//! Runs every scored column of a record set through the Value Transformer or
//! Numeric Normalizer and lays the results out column-major per record, ready
//! for pairwise scoring.

use crate::distance::{tokenize, TokenSet};
use crate::schema::{ColumnRole, ColumnSchema};
use crate::transform::{log_min_max, parse_number, transform_ordinal, ExactMatchTable};
use serde::Serialize;
use studysim_core::{Record, RecordId};
use tracing::{debug, warn};

/// How a column is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    MultiValue,
}

/// Names of the scored columns, in scoring order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureLayout {
    pub numeric: Vec<String>,
    pub multi_value: Vec<String>,
}

impl FeatureLayout {
    #[inline]
    pub fn total_features(&self) -> usize {
        self.numeric.len() + self.multi_value.len()
    }
}

/// A record after transformation; vectors are indexed like [`FeatureLayout`]
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    pub id: RecordId,
    pub numeric: Vec<Option<f64>>,
    /// `None` when the cell was missing or blank
    pub multi_value: Vec<Option<TokenSet>>,
}

#[derive(Debug, Clone)]
pub struct FeatureTable {
    layout: FeatureLayout,
    records: Vec<TransformedRecord>,
}

impl FeatureTable {
    /// Transform `records` according to `schema`.
    ///
    /// A schema column is kept only when every record carries it; the
    /// identifier column is never kept.
    pub fn from_records(records: &[Record], schema: &ColumnSchema) -> Self {
        let present = |column: &str| -> bool {
            if column == schema.id_column {
                warn!(column, "Identifier column listed for scoring, skipping");
                return false;
            }
            let present = !records.is_empty() && records.iter().all(|r| r.has_column(column));
            if !present {
                warn!(column, "Schema column not present in dataset, skipping");
            }
            present
        };

        let mut layout = FeatureLayout::default();
        let mut numeric_columns: Vec<Vec<Option<f64>>> = Vec::new();

        for (column, role) in schema.columns() {
            let transformed: Option<Vec<Option<f64>>> = match role {
                ColumnRole::Ordinal if schema.score_ordinal_columns => Some(
                    records
                        .iter()
                        .map(|r| transform_ordinal(r.get(column)))
                        .collect(),
                ),
                ColumnRole::ExactMatch if schema.score_ordinal_columns => {
                    schema
                        .exact_match
                        .iter()
                        .find(|c| c.name == column)
                        .map(|c| {
                            let table = ExactMatchTable::new(c);
                            records.iter().map(|r| table.transform(r.get(column))).collect()
                        })
                }
                ColumnRole::LogNumeric => {
                    let raw: Vec<Option<f64>> =
                        records.iter().map(|r| parse_number(r.get(column))).collect();
                    Some(log_min_max(column, &raw))
                }
                _ => None,
            };

            if let Some(values) = transformed {
                if present(column) {
                    layout.numeric.push(column.to_string());
                    numeric_columns.push(values);
                }
            }
        }

        let mut multi_columns: Vec<Vec<Option<TokenSet>>> = Vec::new();
        for column in &schema.multi_value {
            if present(column) {
                layout.multi_value.push(column.clone());
                multi_columns.push(
                    records
                        .iter()
                        .map(|r| {
                            r.get(column)
                                .filter(|v| !v.trim().is_empty())
                                .map(tokenize)
                        })
                        .collect(),
                );
            }
        }

        let transformed = records
            .iter()
            .enumerate()
            .map(|(row, record)| TransformedRecord {
                id: record.id,
                numeric: numeric_columns.iter().map(|c| c[row]).collect(),
                multi_value: multi_columns.iter().map(|c| c[row].clone()).collect(),
            })
            .collect();

        if let Some(first) = records.first() {
            let mut unclassified: Vec<&str> = first
                .columns()
                .filter(|c| schema.role_of(c).is_none() && !schema.excluded.iter().any(|e| e == c))
                .collect();
            if !unclassified.is_empty() {
                unclassified.sort_unstable();
                debug!(?unclassified, "Columns without a role are not scored");
            }
        }

        debug!(
            numeric = layout.numeric.len(),
            multi_value = layout.multi_value.len(),
            records = records.len(),
            "Feature table built"
        );

        Self {
            layout,
            records: transformed,
        }
    }

    #[inline]
    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    #[inline]
    pub fn records(&self) -> &[TransformedRecord] {
        &self.records
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn get(&self, id: RecordId) -> Option<&TransformedRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

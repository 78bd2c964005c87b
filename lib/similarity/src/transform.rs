//! Value Transformer and Numeric Normalizer
//!
//! Maps raw cells to scores in [0.0, 1.0]. Anything unrecognised becomes
//! `None` (missing); nothing here returns an error.

use crate::schema::ExactMatchColumn;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Ordinal vocabulary in priority order; the first token found wins
pub const ORDINAL_TOKENS: [(&str, Option<f64>); 8] = [
    ("low", Some(0.0)),
    ("medium", Some(0.5)),
    ("high", Some(1.0)),
    ("yes", Some(1.0)),
    ("no", Some(0.0)),
    ("partly", Some(0.5)),
    ("visual attention", Some(0.5)),
    ("n/a", None),
];

/// Value used for every present cell when a log-scaled column has no spread
pub const DEGENERATE_SCALE_VALUE: f64 = 0.5;

static TOKEN_PATTERNS: Lazy<Vec<(Regex, Option<f64>)>> = Lazy::new(|| {
    ORDINAL_TOKENS
        .iter()
        .filter_map(|(token, score)| {
            // patterns are built from constants; a failure here would be a typo above
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(token)))
                .ok()
                .map(|re| (re, *score))
        })
        .collect()
});

/// Transform an ordinal cell by whole-word, case-insensitive token search
pub fn transform_ordinal(value: Option<&str>) -> Option<f64> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;

    TOKEN_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(value))
        .and_then(|(_, score)| *score)
}

/// Exact-match lookup table for a single column
#[derive(Debug, Clone)]
pub struct ExactMatchTable {
    entries: AHashMap<String, Option<f64>>,
}

impl ExactMatchTable {
    pub fn new(column: &ExactMatchColumn) -> Self {
        Self {
            entries: column
                .values
                .iter()
                .map(|v| (v.value.clone(), v.score))
                .collect(),
        }
    }

    /// Look up the trimmed cell verbatim; no token search
    pub fn transform(&self, value: Option<&str>) -> Option<f64> {
        let value = value?.trim();
        self.entries.get(value).copied().flatten()
    }
}

/// Parse a numeric cell, `None` for missing or non-finite values
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Apply `ln(v + 1)` then min-max scale the column to [0, 1].
///
/// Values at or below -1 have no logarithm and become missing. When every
/// present value is equal the column maps to [`DEGENERATE_SCALE_VALUE`].
pub fn log_min_max(column: &str, values: &[Option<f64>]) -> Vec<Option<f64>> {
    let logged: Vec<Option<f64>> = values
        .iter()
        .map(|v| match v {
            Some(v) if *v > -1.0 => Some(v.ln_1p()),
            Some(v) => {
                warn!(column, value = v, "Value has no log1p, treating as missing");
                None
            }
            None => None,
        })
        .collect();

    let (min, max) = logged
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });

    if min > max {
        // no present values
        return logged;
    }

    let range = max - min;
    if range == 0.0 {
        warn!(column, "Log-scaled column has a single distinct value");
        return logged
            .into_iter()
            .map(|v| v.map(|_| DEGENERATE_SCALE_VALUE))
            .collect();
    }

    logged
        .into_iter()
        .map(|v| v.map(|v| (v - min) / range))
        .collect()
}

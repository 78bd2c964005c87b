//! # studysim Similarity
//!
//! Schema-driven similarity for study records.
//!
//! ## Features
//!
//! - **Column Schema**: explicit classification of columns into ordinal,
//!   exact-match, log-numeric and multi-value roles
//! - **Value Transformer**: ordinal tokens and exact-match tables to [0, 1]
//! - **Numeric Normalizer**: log1p + min-max scaling per column
//! - **Pairwise Scorer**: `1 - |a - b|` for numbers, adjusted Jaccard for token sets
//! - **Matrix Assembler**: symmetric matrices from the upper triangle, in parallel
//! - **Embedding Similarity**: cosine matrices over abstract embeddings
//!
//! ## Example
//!
//! ```rust
//! use studysim_core::{Record, RecordId, Standardizer};
//! use studysim_similarity::{build_feature_similarity, ColumnSchema};
//!
//! let mut schema = ColumnSchema::empty();
//! schema.multi_value.push("Input Body Part".to_string());
//!
//! let records = vec![
//!     Record::new(RecordId(1), None).with_field("Input Body Part", Some("Hand, Head")),
//!     Record::new(RecordId(2), None).with_field("Input Body Part", Some("Head, Face")),
//! ];
//!
//! let result = build_feature_similarity(&records, &schema, &Standardizer::default()).unwrap();
//! assert_eq!(result.raw.get(0, 1), Some(0.5));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │   Schema    │────>│  Transform  │────>│   Scorer    │────>│  Assembler   │
//! │  (columns)  │     │ (cells→0..1)│     │ (pair→0..1) │     │ (N×N matrix) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────────────┘
//!                                                                    │
//! ┌─────────────┐     ┌─────────────┐                         ┌──────────────┐
//! │ Embeddings  │────>│   Cosine    │────────────────────────>│ Standardizer │
//! └─────────────┘     └─────────────┘                         └──────────────┘
//! ```

pub mod assembler;
pub mod distance;
pub mod embedding;
pub mod explain;
pub mod features;
pub mod schema;
pub mod scorer;
pub mod transform;

// Re-export main types for convenience
pub use assembler::{assemble, build_feature_similarity, FeatureSimilarity};
pub use distance::{adjusted_jaccard, numeric_similarity, tokenize, TokenSet};
pub use embedding::{build_abstract_similarity, cosine_matrix, AbstractSimilarity};
pub use explain::{ColumnContribution, PairExplanation};
pub use features::{FeatureKind, FeatureLayout, FeatureTable, TransformedRecord};
pub use schema::{ColumnRole, ColumnSchema, ExactMatchColumn, ExactValue, SchemaError};
pub use scorer::PairwiseScorer;
pub use transform::{
    log_min_max, parse_number, transform_ordinal, ExactMatchTable, DEGENERATE_SCALE_VALUE,
    ORDINAL_TOKENS,
};

//! # studysim Core
//!
//! Core types shared by the studysim crates.
//!
//! - [`Record`] / [`RecordId`] - one study row with raw cell values
//! - [`Vector`] - dense embedding vector with cosine similarity
//! - [`SimilarityMatrix`] - square, symmetric matrix keyed by record id
//! - [`Standardizer`] - z-scores off-diagonal entries and nulls the diagonal
//!
//! ## Example
//!
//! ```rust
//! use studysim_core::{RecordId, SimilarityMatrix, Standardizer};
//!
//! let ids = vec![RecordId(1), RecordId(2), RecordId(3)];
//! let mut matrix = SimilarityMatrix::zeros(ids).unwrap();
//! matrix.set_diagonal(Some(1.0));
//! matrix.set_pair(0, 1, Some(0.2));
//! matrix.set_pair(0, 2, Some(0.4));
//! matrix.set_pair(1, 2, Some(0.6));
//!
//! let (standardized, moments) = Standardizer::default().standardize(&matrix);
//! assert_eq!(standardized.get(0, 0), None);
//! assert!((moments.mean - 0.4).abs() < 1e-12);
//! ```

pub mod error;
pub mod matrix;
pub mod record;
pub mod standardize;
pub mod vector;

pub use error::{Error, Result};
pub use matrix::{Link, SimilarityMatrix};
pub use record::{Record, RecordId};
pub use standardize::{Moments, Standardizer, ZeroVariancePolicy};
pub use vector::Vector;

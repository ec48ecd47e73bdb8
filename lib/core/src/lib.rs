//! # jsonvec Core
//!
//! Core library for the jsonvec document vectorizer.
//!
//! This crate provides the building blocks shared by every other crate:
//!
//! - [`JsonType`] - The closed set of document value kinds
//! - [`classify`] - Runtime classification of a single value
//! - [`SparseBoolMatrix`] - List-of-lists sparse boolean matrix
//! - [`Error`] / [`Result`] - Shared error type
//!
//! ## Example
//!
//! ```rust
//! use jsonvec_core::{classify, JsonType, SparseBoolMatrix};
//! use serde_json::json;
//!
//! assert_eq!(classify(&json!("2020-01-02T03:04:05Z")).unwrap(), JsonType::Timestamp);
//!
//! let mut matrix = SparseBoolMatrix::new(2, 4);
//! matrix.insert(0, 3).unwrap();
//! matrix.insert(0, 1).unwrap();
//! assert_eq!(matrix.row(0).unwrap(), &[1, 3]);
//! ```

pub mod error;
pub mod sparse;
pub mod types;

pub use error::{Error, Result};
pub use sparse::SparseBoolMatrix;
pub use types::{classify, is_timestamp, JsonType, TIMESTAMP_FORMAT};

//! # jsonvec
//!
//! Schema inference and sparse binary feature extraction for
//! semi-structured JSON documents.
//!
//! jsonvec learns the structure of a document collection (types seen at
//! every path, optional properties, array items), fits a feature extractor
//! per field and type, and turns documents into rows of a sparse boolean
//! matrix ready for downstream learning algorithms.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! jsonvec fit --input docs.jsonl.gz --snapshot-dir ./models --name products
//! jsonvec transform --snapshot ./models/products.snapshot --input new.jsonl --output rows.jsonl
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use jsonvec::prelude::*;
//! use serde_json::json;
//!
//! let docs = vec![
//!     json!({"title": "red shirt", "price": 12.5, "tags": ["sale"]}),
//!     json!({"title": "blue shirt", "price": 30.0, "tags": []}),
//!     json!({"title": "red hat", "price": 9.0}),
//! ];
//!
//! let mut vectorizer = JsonVectorizer::builder()
//!     .ignore([r"^root\.id$"])
//!     .build()
//!     .unwrap();
//! vectorizer.extend(&docs).unwrap();
//! vectorizer.prune(&[], &PruneThreshold::Count(1));
//! let n_features = vectorizer.fit(None).unwrap();
//!
//! let matrix = vectorizer.transform(&docs).unwrap();
//! assert_eq!(matrix.shape(), (3, n_features));
//! ```
//!
//! ## Crate Structure
//!
//! - [`jsonvec-core`](https://docs.rs/jsonvec-core) - JSON type classification, sparse boolean matrix, errors
//! - [`jsonvec-extractors`](https://docs.rs/jsonvec-extractors) - Per-type feature extractors and rule tables
//! - [`jsonvec-schema`](https://docs.rs/jsonvec-schema) - Schema tree, pruning, fitting, transformation
//! - [`jsonvec-storage`](https://docs.rs/jsonvec-storage) - JSON-lines readers and vectorizer snapshots

// Re-export core types
pub use jsonvec_core::{classify, is_timestamp, Error, JsonType, Result, SparseBoolMatrix};

// Re-export extractors
pub use jsonvec_extractors::{
    default_rules, Extractor, ExtractorConfig, ExtractorRule, FittedExtractor, RuleSpec, Threshold,
};

// Re-export schema
pub use jsonvec_schema::{
    Dropped, FitContext, FrequencyBasis, JsonVectorizer, NodeRepr, PruneSpec, PruneThreshold,
    SchemaNode, SharedVectorizer, VectorizerBuilder, VectorizerConfig, VectorizerSnapshot,
};

// Re-export storage
pub use jsonvec_storage::{DocumentReader, SnapshotDescription, SnapshotManager, StorageError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        classify, DocumentReader, Dropped, Error, ExtractorConfig, ExtractorRule, JsonType,
        JsonVectorizer, PruneSpec, PruneThreshold, Result, SchemaNode, SharedVectorizer,
        SnapshotManager, SparseBoolMatrix, VectorizerConfig,
    };
}

//! # jsonvec Schema
//!
//! Schema inference and sparse vectorization of semi-structured documents.
//!
//! ## Overview
//!
//! A [`SchemaNode`] tree is grown from example documents, one node per
//! position in the document structure. Each node remembers the JSON types
//! seen there, their frequencies, the properties of objects (and which are
//! always present), the schemas of array items, and a buffer of leaf values.
//!
//! **Lifecycle:**
//! 1. `extend` walks documents and grows the tree
//! 2. `prune` drops rare types and unwanted paths
//! 3. `fit` turns buffered samples into extractors and assigns columns
//! 4. `transform` writes document batches into a [`SparseBoolMatrix`]
//!
//! ## Example
//!
//! ```rust
//! use jsonvec_schema::JsonVectorizer;
//! use serde_json::json;
//!
//! let docs = vec![
//!     json!({"name": "red shirt", "size": 1, "sale": true}),
//!     json!({"name": "blue shirt", "size": 3, "sale": false}),
//!     json!({"name": "red hat", "size": 2}),
//! ];
//!
//! let mut vectorizer = JsonVectorizer::new(false);
//! let n_features = vectorizer.fit(Some(&docs)).unwrap();
//! assert!(vectorizer.feature_names().contains(&"root has property sale".to_string()));
//!
//! let matrix = vectorizer.transform(&docs).unwrap();
//! assert_eq!(matrix.shape(), (3, n_features));
//! ```
//!
//! ## Columns
//!
//! ```text
//! root ─┬─ "root has property sale"       indicator columns
//!       ├─ name  ─ "root.name has token ..."  extractor columns
//!       ├─ sale  ─ "root.sale = True"
//!       └─ size  ─ "root.size in [..)"
//! ```
//!
//! Nodes own contiguous column blocks assigned in pre-order: a node's own
//! features first, then its properties in lexicographic order, then its
//! array items in index order.
//!
//! [`SparseBoolMatrix`]: jsonvec_core::SparseBoolMatrix

pub mod fit;
pub mod node;
pub mod prune;
pub mod repr;
pub mod shared;
pub mod transform;
pub mod vectorizer;

pub use fit::{ColumnCursor, FitContext};
pub use node::{FittedState, NodePhase, SchemaNode, PATH_SEPARATOR, ROOT_SEGMENT};
pub use prune::{Dropped, FrequencyBasis, PruneThreshold};
pub use repr::NodeRepr;
pub use shared::SharedVectorizer;
pub use vectorizer::{
    BasisKind, JsonVectorizer, PruneSpec, VectorizerBuilder, VectorizerConfig, VectorizerSnapshot,
    DEFAULT_CHUNK_SIZE, SNAPSHOT_VERSION,
};

//! # jsonvec Storage
//!
//! File formats around the vectorizer:
//!
//! - [`DocumentReader`]: JSON-lines input, plain or gzip, streamed in batches
//! - [`write_rows`]: feature matrix output as one JSON array per document
//! - [`SnapshotManager`]: gzip JSON snapshots of fitted vectorizers, written
//!   atomically and checked against a SHA-256 sidecar on load

pub mod error;
pub mod reader;
pub mod snapshot;
pub mod writer;

pub use error::{Result, StorageError};
pub use reader::{Batches, DocumentReader};
pub use snapshot::{load_from_path, SnapshotDescription, SnapshotManager};
pub use writer::{create_output, write_rows};

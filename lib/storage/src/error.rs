use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in {path} at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Core(#[from] jsonvec_core::Error),
}

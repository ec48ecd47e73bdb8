use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Cannot classify value: {0}")]
    Classification(String),

    #[error("Invalid type name: {0}")]
    InvalidTypeName(String),

    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),

    #[error("Schema node not fitted: {0}")]
    NotFitted(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

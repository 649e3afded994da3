//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for doRiNA operations
pub type Result<T> = std::result::Result<T, DorinaError>;

/// Main error type for doRiNA
#[derive(Error, Debug)]
pub enum DorinaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed result line: {0}")]
    MalformedLine(String),

    #[error("Genome not found: {0}")]
    GenomeNotFound(String),

    #[error("Regulator not found: {0}")]
    RegulatorNotFound(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),
}

//! Error types for hepplot

use thiserror::Error;

/// hepplot error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (missing or unreadable input file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Validation error (wrong shape, empty list, length mismatch, unknown option)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced name is not present in the loaded set
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Numeric-domain error (zero bin in a ratio band, negative value under sqrt)
    #[error("Domain error: {0}")]
    Domain(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

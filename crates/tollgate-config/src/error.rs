use std::io;
use thiserror::Error;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a policy document.
    #[error("Failed to read policy document at {path}: {source}")]
    ReadError {
        /// Path to the document that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to parse a policy document.
    #[error("Failed to parse policy document at {path}: {message}")]
    ParseError {
        /// Path to the document that failed to parse.
        path: String,
        /// Parser error description.
        message: String,
    },

    /// The document extension does not name a supported format.
    #[error("Unsupported policy document format for {path}; expected .yaml, .yml, .toml or .json")]
    UnsupportedFormat {
        /// Path whose extension was not recognised.
        path: String,
    },

    /// Policy document validation failed.
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Field that failed validation.
        field: String,
        /// Validation failure description.
        message: String,
    },

    /// Failed to serialize a policy document.
    #[error("Failed to serialize policy document: {0}")]
    SerializeError(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

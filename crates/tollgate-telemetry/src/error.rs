//! Telemetry error types.

/// Errors raised while installing logging.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The logging configuration is invalid.
    #[error("invalid logging configuration: {0}")]
    Config(String),

    /// A global subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Init(String),

    /// The log destination could not be prepared.
    #[error("log destination error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

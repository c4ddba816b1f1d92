//! Tollgate Telemetry - logging setup for tollgate binaries and services.
//!
//! Approval decisions are logged through `tracing` with structured fields
//! (`signature`, `approver`, `decision`, `sample_id`). This crate installs a
//! subscriber for them: an `EnvFilter` built from a level plus per-crate
//! directives, one of four formats, written to stdout, stderr or a rolling
//! file.
//!
//! # Example
//!
//! ```rust,no_run
//! use tollgate_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), tollgate_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("tollgate_approval=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!(approver = "human", "Waiting for operator");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};

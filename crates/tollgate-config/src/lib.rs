#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Declarative approval policy documents.
//!
//! A policy document is an ordered list of approver entries. Each entry names
//! an approver, the tool patterns it is responsible for, and any extra keys,
//! which are forwarded to the approver as construction parameters:
//!
//! ```yaml
//! approvers:
//!   - name: evaltools/bash_allowlist
//!     tools: bash
//!     allowed_commands: [ls, echo]
//!   - name: human
//!     tools: ["web_browser_click", "web_browser_type*"]
//!   - name: auto
//!     tools: "*"
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use tollgate_config::ApprovalSelection;
//!
//! let selection: ApprovalSelection = "approval.yaml".parse().unwrap();
//! let config = selection.resolve().unwrap();
//! println!("{} approvers", config.approvers.len());
//! ```
//!
//! # Design
//!
//! This crate has **no dependencies on other internal tollgate crates**. It
//! only describes and validates documents; turning a document into a policy
//! chain happens in `tollgate-approval`, which owns the approver registry.

/// Configuration error types.
pub mod error;
/// Policy document discovery and parsing.
pub mod loader;
/// Run-level approval selection.
pub mod selection;
/// Policy document struct definitions.
pub mod types;
/// Policy document validation rules.
pub mod validate;

// Re-export primary types at the crate root.
pub use error::{ConfigError, ConfigResult};
pub use loader::{DocumentFormat, MAX_POLICY_FILE_SIZE};
pub use selection::ApprovalSelection;
pub use types::{ApprovalPolicyConfig, ApproverParams, ApproverPolicyConfig, ToolPatterns};

impl ApprovalPolicyConfig {
    /// Load and validate a policy document from disk.
    ///
    /// The format is chosen from the file extension.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse and validate a policy document held in memory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text cannot be parsed or fails
    /// validation.
    pub fn parse(text: &str, format: DocumentFormat) -> ConfigResult<Self> {
        loader::parse_str(text, format, "<inline>")
    }
}

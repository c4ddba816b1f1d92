//! Post-parse policy document validation.
//!
//! Runs before any approver is constructed so that a malformed document
//! stops a run at startup instead of at the first tool call.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{ApprovalPolicyConfig, RESERVED_KEYS};

/// Validate a parsed policy document.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &ApprovalPolicyConfig) -> ConfigResult<()> {
    if config.approvers.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "approvers".to_owned(),
            message: "policy document must declare at least one approver".to_owned(),
        });
    }

    for (i, entry) in config.approvers.iter().enumerate() {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("approvers[{i}].name"),
                message: "approver name must not be empty".to_owned(),
            });
        }

        if entry.tools.as_slice().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("approvers[{i}].tools"),
                message: format!("approver '{}' must declare at least one tool pattern", entry.name),
            });
        }

        for (j, pattern) in entry.tools.iter().enumerate() {
            if pattern.is_empty() {
                return Err(ConfigError::ValidationError {
                    field: format!("approvers[{i}].tools[{j}]"),
                    message: "tool pattern must not be empty".to_owned(),
                });
            }
        }

        if let Some(key) = RESERVED_KEYS.iter().find(|k| entry.params.contains_key(**k)) {
            return Err(ConfigError::ValidationError {
                field: format!("approvers[{i}].{key}"),
                message: format!("'{key}' is reserved and cannot be an approver parameter"),
            });
        }
    }

    Ok(())
}

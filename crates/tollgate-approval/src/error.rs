use tollgate_config::ConfigError;

/// Errors raised while building policy chains or resolving tool calls.
///
/// A policy-driven `reject` is a normal [`Approval`](tollgate_core::Approval),
/// never one of these. Callers should treat resolution-time errors as a
/// failure of the approval mechanism for that sample.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The policy document could not be loaded or is invalid.
    #[error("invalid approval configuration: {0}")]
    Config(#[from] ConfigError),

    /// No approver is registered under this name.
    #[error("unknown approver '{name}'")]
    UnknownApprover {
        /// The name that failed to resolve.
        name: String,
    },

    /// An approver rejected its construction parameters.
    #[error("invalid parameters for approver '{approver}': {message}")]
    InvalidParameters {
        /// Approver being constructed.
        approver: String,
        /// What was wrong.
        message: String,
    },

    /// A tool pattern could not be parsed.
    #[error("invalid tool pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// What was wrong.
        message: String,
    },

    /// A human approver was configured but no operator channel is attached.
    #[error("approver '{approver}' needs an operator channel but none is attached")]
    NoOperatorChannel {
        /// Approver being constructed.
        approver: String,
    },

    /// An approver failed while deciding.
    #[error("approver '{approver}' failed: {message}")]
    ApproverFailed {
        /// Approver that failed.
        approver: String,
        /// Failure description.
        message: String,
    },

    /// The operator channel went away while a call was waiting on it.
    #[error("human approval channel closed")]
    HumanChannelClosed,

    /// The operator answered with something that cannot become a decision.
    #[error("invalid operator response: {0}")]
    InvalidOperatorResponse(String),

    /// The resolution was abandoned because its sample or run was cancelled.
    #[error("approval cancelled: {reason}")]
    Cancelled {
        /// Why the resolution was abandoned.
        reason: String,
    },
}

impl ApprovalError {
    /// Wrap an arbitrary failure raised inside an approver.
    pub fn approver_failed(approver: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::ApproverFailed {
            approver: approver.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error is detected while building a chain (fatal to
    /// startup) rather than while resolving a call.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::UnknownApprover { .. }
                | Self::InvalidParameters { .. }
                | Self::InvalidPattern { .. }
                | Self::NoOperatorChannel { .. }
        )
    }
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        assert!(ApprovalError::UnknownApprover { name: "x".into() }.is_configuration());
        assert!(
            ApprovalError::NoOperatorChannel {
                approver: "human".into()
            }
            .is_configuration()
        );
        assert!(!ApprovalError::HumanChannelClosed.is_configuration());
        assert!(!ApprovalError::approver_failed("model", "timeout").is_configuration());
    }

    #[test]
    fn test_approver_failed_message() {
        let err = ApprovalError::approver_failed("model", "rate limited");
        assert_eq!(err.to_string(), "approver 'model' failed: rate limited");
    }
}

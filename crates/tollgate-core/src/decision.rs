//! Approval decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::call::ToolCall;

/// The verdict an approver reaches on a tool call.
///
/// Only [`Escalate`](Self::Escalate) lets a policy chain continue; every other
/// decision ends resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// Run the call as issued.
    Approve,
    /// Run a replacement call instead.
    Modify,
    /// Do not run the call; the agent is told why.
    Reject,
    /// Defer to the next matching policy.
    Escalate,
    /// Abort the whole sample.
    Terminate,
}

impl ApprovalDecision {
    /// All decisions, in presentation order.
    pub const ALL: [Self; 5] = [
        Self::Approve,
        Self::Modify,
        Self::Reject,
        Self::Escalate,
        Self::Terminate,
    ];

    /// Whether this decision ends a chain walk.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Escalate)
    }

    /// Whether the caller may execute a call after this decision.
    #[must_use]
    pub fn allows_execution(self) -> bool {
        matches!(self, Self::Approve | Self::Modify)
    }

    /// Lowercase name used in configuration and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Modify => "modify",
            Self::Reject => "reject",
            Self::Escalate => "escalate",
            Self::Terminate => "terminate",
        }
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the five decisions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown approval decision '{0}'; expected approve, modify, reject, escalate or terminate")]
pub struct ParseDecisionError(pub String);

impl FromStr for ApprovalDecision {
    type Err = ParseDecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseDecisionError(s.to_owned()))
    }
}

/// A decision together with its explanation.
///
/// `modified` is populated only for [`ApprovalDecision::Modify`]; use the
/// constructors rather than building the struct by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    /// The decision reached.
    pub decision: ApprovalDecision,
    /// Human-readable explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Replacement call, for `modify` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<ToolCall>,
}

impl Approval {
    /// Build an approval for any decision other than `modify`.
    ///
    /// A `modify` decision passed here carries no replacement call; prefer
    /// [`Approval::modify`].
    #[must_use]
    pub fn new(decision: ApprovalDecision, explanation: impl Into<String>) -> Self {
        Self {
            decision,
            explanation: Some(explanation.into()),
            modified: None,
        }
    }

    /// Approve the call.
    #[must_use]
    pub fn approve(explanation: impl Into<String>) -> Self {
        Self::new(ApprovalDecision::Approve, explanation)
    }

    /// Replace the call with `call`.
    #[must_use]
    pub fn modify(call: ToolCall, explanation: impl Into<String>) -> Self {
        Self {
            decision: ApprovalDecision::Modify,
            explanation: Some(explanation.into()),
            modified: Some(call),
        }
    }

    /// Reject the call.
    #[must_use]
    pub fn reject(explanation: impl Into<String>) -> Self {
        Self::new(ApprovalDecision::Reject, explanation)
    }

    /// Defer to the next policy.
    #[must_use]
    pub fn escalate(explanation: impl Into<String>) -> Self {
        Self::new(ApprovalDecision::Escalate, explanation)
    }

    /// Abort the sample.
    #[must_use]
    pub fn terminate(explanation: impl Into<String>) -> Self {
        Self::new(ApprovalDecision::Terminate, explanation)
    }

    /// Explanation text, empty when none was given.
    #[must_use]
    pub fn explanation(&self) -> &str {
        self.explanation.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for Approval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.explanation {
            Some(explanation) => write!(f, "{}: {explanation}", self.decision),
            None => write!(f, "{}", self.decision),
        }
    }
}

//! The approver capability and the built-in `auto` approver.

use async_trait::async_trait;
use serde_json::Value;
use tollgate_config::ApproverParams;
use tollgate_core::{Approval, ApprovalDecision, TaskState, ToolCall, ToolCallView};

use crate::error::{ApprovalError, ApprovalResult};

/// Explanation returned by [`AutoApprover`] unless configured otherwise.
pub const AUTO_EXPLANATION: &str = "Automatic decision.";

const AUTO_CANNOT_MODIFY: &str = "auto approver cannot return 'modify'";

/// Judges one pending tool call.
///
/// Implementations may return immediately, wait on an operator, or call out
/// to other services. Returning [`ApprovalDecision::Escalate`] hands the call
/// to the next matching policy in the chain. Returning an error aborts the
/// resolution; it is never interpreted as a rejection.
#[async_trait]
pub trait Approver: Send + Sync {
    /// Name this approver was registered under.
    fn name(&self) -> &str;

    /// Decide on `call`.
    ///
    /// `message` is the assistant message that issued the call. `view` is the
    /// tool-specific rendering (possibly empty). `state` is absent when the
    /// call is resolved outside a running sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the approver itself fails.
    async fn decide(
        &self,
        message: &str,
        call: &ToolCall,
        view: &ToolCallView,
        state: Option<&TaskState>,
    ) -> ApprovalResult<Approval>;

    /// Construction parameters, as they would appear in a policy document.
    fn params(&self) -> ApproverParams {
        ApproverParams::new()
    }
}

/// Returns a fixed decision for every call.
#[derive(Debug, Clone)]
pub struct AutoApprover {
    name: String,
    decision: ApprovalDecision,
    explanation: String,
}

impl AutoApprover {
    /// Registry name of the built-in.
    pub const NAME: &'static str = "auto";

    /// Auto approver that approves everything.
    #[must_use]
    pub fn approve() -> Self {
        Self {
            name: Self::NAME.to_owned(),
            decision: ApprovalDecision::Approve,
            explanation: AUTO_EXPLANATION.to_owned(),
        }
    }

    /// Auto approver with a fixed decision.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidParameters`] for `modify`, which has no
    /// replacement call to offer.
    pub fn with_decision(decision: ApprovalDecision) -> ApprovalResult<Self> {
        if decision == ApprovalDecision::Modify {
            return Err(ApprovalError::InvalidParameters {
                approver: Self::NAME.to_owned(),
                message: AUTO_CANNOT_MODIFY.to_owned(),
            });
        }
        Ok(Self {
            decision,
            ..Self::approve()
        })
    }

    /// Override the explanation.
    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Build from policy parameters (`decision`, `explanation`).
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidParameters`] on unknown keys or
    /// ill-typed values.
    pub fn from_params(name: &str, params: &ApproverParams) -> ApprovalResult<Self> {
        let invalid = |message: String| ApprovalError::InvalidParameters {
            approver: name.to_owned(),
            message,
        };

        let mut auto = Self::approve();
        auto.name = name.to_owned();
        for (key, value) in params {
            match (key.as_str(), value) {
                ("decision", Value::String(raw)) => {
                    let decision = raw
                        .parse::<ApprovalDecision>()
                        .map_err(|e| invalid(e.to_string()))?;
                    if decision == ApprovalDecision::Modify {
                        return Err(invalid(AUTO_CANNOT_MODIFY.to_owned()));
                    }
                    auto.decision = decision;
                },
                ("explanation", Value::String(text)) => {
                    auto.explanation.clone_from(text);
                },
                ("decision" | "explanation", other) => {
                    return Err(invalid(format!("'{key}' must be a string, got {other}")));
                },
                _ => return Err(invalid(format!("unknown parameter '{key}'"))),
            }
        }
        Ok(auto)
    }

    /// The configured decision.
    #[must_use]
    pub fn decision(&self) -> ApprovalDecision {
        self.decision
    }
}

impl Default for AutoApprover {
    fn default() -> Self {
        Self::approve()
    }
}

#[async_trait]
impl Approver for AutoApprover {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide(
        &self,
        _message: &str,
        _call: &ToolCall,
        _view: &ToolCallView,
        _state: Option<&TaskState>,
    ) -> ApprovalResult<Approval> {
        Ok(Approval::new(self.decision, self.explanation.clone()))
    }

    fn params(&self) -> ApproverParams {
        let mut params = ApproverParams::new();
        if self.decision != ApprovalDecision::Approve {
            params.insert("decision".into(), Value::from(self.decision.as_str()));
        }
        if self.explanation != AUTO_EXPLANATION {
            params.insert("explanation".into(), Value::from(self.explanation.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> ApproverParams {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_auto_default_approves() {
        let auto = AutoApprover::default();
        let call = ToolCall::new("bash").with_arg("cmd", "ls");
        let approval = auto
            .decide("", &call, &ToolCallView::default(), None)
            .await
            .unwrap();
        assert_eq!(approval.decision, ApprovalDecision::Approve);
        assert_eq!(approval.explanation(), AUTO_EXPLANATION);
        assert!(approval.modified.is_none());
    }

    #[tokio::test]
    async fn test_auto_from_params() {
        let auto = AutoApprover::from_params(
            "auto",
            &params(json!({"decision": "reject", "explanation": "no tools today"})),
        )
        .unwrap();
        let approval = auto
            .decide("", &ToolCall::new("bash"), &ToolCallView::default(), None)
            .await
            .unwrap();
        assert_eq!(approval.decision, ApprovalDecision::Reject);
        assert_eq!(approval.explanation(), "no tools today");
    }

    #[test]
    fn test_auto_explanation_before_decision() {
        let auto = AutoApprover::from_params(
            "auto",
            &params(json!({"explanation": "fixed", "decision": "escalate"})),
        )
        .unwrap();
        assert_eq!(auto.decision(), ApprovalDecision::Escalate);
        assert_eq!(auto.explanation, "fixed");
    }

    #[test]
    fn test_auto_rejects_modify() {
        let err = AutoApprover::from_params("strict", &params(json!({"decision": "modify"})))
            .unwrap_err();
        assert!(matches!(err, ApprovalError::InvalidParameters { ref approver, .. } if approver == "strict"));
        assert_eq!(
            err.to_string(),
            "invalid parameters for approver 'strict': auto approver cannot return 'modify'"
        );
    }

    #[test]
    fn test_auto_rejects_unknown_params() {
        assert!(AutoApprover::from_params("auto", &params(json!({"decisions": "x"}))).is_err());
        assert!(AutoApprover::from_params("auto", &params(json!({"decision": 3}))).is_err());
        assert!(AutoApprover::from_params("auto", &params(json!({"decision": "maybe"}))).is_err());
    }

    #[test]
    fn test_auto_params_round_trip() {
        assert!(AutoApprover::default().params().is_empty());
        let auto = AutoApprover::with_decision(ApprovalDecision::Terminate).unwrap();
        let rebuilt = AutoApprover::from_params("auto", &auto.params()).unwrap();
        assert_eq!(rebuilt.decision(), ApprovalDecision::Terminate);
    }
}

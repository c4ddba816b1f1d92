//! The built-in `human` approver.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tollgate_config::ApproverParams;
use tollgate_core::{Approval, ApprovalDecision, TaskState, ToolCall, ToolCallView};
use tracing::{debug, info};

use crate::approver::Approver;
use crate::error::{ApprovalError, ApprovalResult};
use crate::operator::{OperatorChannel, OperatorRequest, OperatorResponse, RequestId};

/// Explanation used when the operator gives none for a `modify`.
const MODIFIED_EXPLANATION: &str = "Modified by operator.";

/// Serializes presentation to a single operator.
///
/// Clones share the same lock. Only the prompt is serialized: a call that
/// is waiting for its turn holds nothing else, and dropping the waiting
/// future releases its place.
#[derive(Debug, Clone, Default)]
pub struct PresentationLock(Arc<Mutex<()>>);

impl PresentationLock {
    /// Create an unshared lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the operator to be free.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Presents calls to an interactive operator and returns their decision.
pub struct HumanApprover {
    name: String,
    channel: Arc<dyn OperatorChannel>,
    presentation: PresentationLock,
    choices: Vec<ApprovalDecision>,
}

impl HumanApprover {
    /// Registry name of the built-in.
    pub const NAME: &'static str = "human";

    /// Create a human approver offering every decision.
    #[must_use]
    pub fn new(channel: Arc<dyn OperatorChannel>, presentation: PresentationLock) -> Self {
        Self {
            name: Self::NAME.to_owned(),
            channel,
            presentation,
            choices: ApprovalDecision::ALL.to_vec(),
        }
    }

    /// Restrict the decisions offered to the operator.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidParameters`] if `choices` is empty.
    pub fn with_choices(mut self, choices: Vec<ApprovalDecision>) -> ApprovalResult<Self> {
        if choices.is_empty() {
            return Err(ApprovalError::InvalidParameters {
                approver: self.name,
                message: "'choices' must not be empty".to_owned(),
            });
        }
        self.choices = choices;
        Ok(self)
    }

    /// Build from policy parameters (`choices`).
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidParameters`] on unknown keys or
    /// unparseable decisions.
    pub fn from_params(
        name: &str,
        params: &ApproverParams,
        channel: Arc<dyn OperatorChannel>,
        presentation: PresentationLock,
    ) -> ApprovalResult<Self> {
        let invalid = |message: String| ApprovalError::InvalidParameters {
            approver: name.to_owned(),
            message,
        };

        let mut human = Self::new(channel, presentation);
        human.name = name.to_owned();
        for (key, value) in params {
            match (key.as_str(), value) {
                ("choices", Value::Array(items)) => {
                    let choices = items
                        .iter()
                        .map(|item| {
                            item.as_str()
                                .ok_or_else(|| invalid(format!("choice {item} is not a string")))?
                                .parse::<ApprovalDecision>()
                                .map_err(|e| invalid(e.to_string()))
                        })
                        .collect::<ApprovalResult<Vec<_>>>()?;
                    human = human.with_choices(choices)?;
                },
                ("choices", other) => {
                    return Err(invalid(format!("'choices' must be a list, got {other}")));
                },
                _ => return Err(invalid(format!("unknown parameter '{key}'"))),
            }
        }
        Ok(human)
    }

    fn to_approval(
        &self,
        id: RequestId,
        call: &ToolCall,
        response: OperatorResponse,
    ) -> ApprovalResult<Approval> {
        if response.request_id != id {
            return Err(ApprovalError::InvalidOperatorResponse(format!(
                "response for {} does not answer {id}",
                response.request_id
            )));
        }
        if !self.choices.contains(&response.decision) {
            return Err(ApprovalError::InvalidOperatorResponse(format!(
                "'{}' was not offered",
                response.decision
            )));
        }

        if response.decision == ApprovalDecision::Modify {
            let Some(arguments) = response.arguments else {
                return Err(ApprovalError::InvalidOperatorResponse(
                    "'modify' requires replacement arguments".to_owned(),
                ));
            };
            let explanation = response
                .explanation
                .unwrap_or_else(|| MODIFIED_EXPLANATION.to_owned());
            return Ok(Approval::modify(
                call.clone().with_arguments(arguments),
                explanation,
            ));
        }

        Ok(Approval {
            decision: response.decision,
            explanation: response.explanation,
            modified: None,
        })
    }
}

impl std::fmt::Debug for HumanApprover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HumanApprover")
            .field("name", &self.name)
            .field("choices", &self.choices)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Approver for HumanApprover {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide(
        &self,
        message: &str,
        call: &ToolCall,
        view: &ToolCallView,
        state: Option<&TaskState>,
    ) -> ApprovalResult<Approval> {
        let mut request = OperatorRequest::new(message, call.clone(), view.clone())
            .with_choices(self.choices.clone());
        if let Some(state) = state {
            request = request.with_sample(state.key());
        }
        let id = request.id;

        let response = {
            let _turn = self.presentation.acquire().await;
            debug!(
                approver = %self.name,
                request_id = %id,
                function = %call.function,
                "Presenting call to operator"
            );
            self.channel.prompt(request).await?
        };

        info!(
            approver = %self.name,
            request_id = %id,
            decision = %response.decision,
            "Operator answered"
        );
        self.to_approval(id, call, response)
    }

    fn params(&self) -> ApproverParams {
        let mut params = ApproverParams::new();
        if self.choices != ApprovalDecision::ALL {
            let choices = self
                .choices
                .iter()
                .map(|d| Value::from(d.as_str()))
                .collect();
            params.insert("choices".into(), Value::Array(choices));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::OperatorQueue;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers every prompt with the same response builder.
    struct Script(fn(RequestId) -> OperatorResponse);

    impl Script {
        fn new(answer: fn(RequestId) -> OperatorResponse) -> Arc<Self> {
            Arc::new(Self(answer))
        }
    }

    #[async_trait]
    impl OperatorChannel for Script {
        async fn prompt(&self, request: OperatorRequest) -> ApprovalResult<OperatorResponse> {
            Ok((self.0)(request.id))
        }
    }

    /// Records how many prompts are outstanding at once.
    #[derive(Default)]
    struct Overlap {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl OperatorChannel for Overlap {
        async fn prompt(&self, request: OperatorRequest) -> ApprovalResult<OperatorResponse> {
            let now = self.active.fetch_add(1, Ordering::SeqCst).saturating_add(1);
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(OperatorResponse::new(request.id, ApprovalDecision::Approve))
        }
    }

    fn human(channel: Arc<dyn OperatorChannel>) -> HumanApprover {
        HumanApprover::new(channel, PresentationLock::new())
    }

    async fn decide(human: &HumanApprover, call: &ToolCall) -> ApprovalResult<Approval> {
        human.decide("", call, &ToolCallView::default(), None).await
    }

    #[tokio::test]
    async fn test_operator_decision_is_returned_unchanged() {
        let h = human(Script::new(|id| {
            OperatorResponse::new(id, ApprovalDecision::Reject).with_explanation("unsafe input")
        }));
        let approval = decide(&h, &ToolCall::new("web_browser_type")).await.unwrap();
        assert_eq!(approval.decision, ApprovalDecision::Reject);
        assert_eq!(approval.explanation.as_deref(), Some("unsafe input"));
    }

    #[tokio::test]
    async fn test_modify_replaces_arguments() {
        let h = human(Script::new(|id| {
            let args = json!({"cmd": "ls"}).as_object().cloned().unwrap();
            OperatorResponse::new(id, ApprovalDecision::Modify).with_arguments(args)
        }));
        let call = ToolCall::new("bash").with_arg("cmd", "rm -rf /");
        let approval = decide(&h, &call).await.unwrap();
        let modified = approval.modified.unwrap();
        assert_eq!(modified.signature(), "bash(cmd='ls')");
        assert_eq!(modified.id, call.id);
        assert_eq!(approval.explanation.as_deref(), Some(MODIFIED_EXPLANATION));
    }

    #[tokio::test]
    async fn test_modify_without_arguments_is_invalid() {
        let h = human(Script::new(|id| {
            OperatorResponse::new(id, ApprovalDecision::Modify)
        }));
        let err = decide(&h, &ToolCall::new("bash")).await.unwrap_err();
        assert!(matches!(err, ApprovalError::InvalidOperatorResponse(_)));
    }

    #[tokio::test]
    async fn test_mismatched_request_id_is_invalid() {
        let h = human(Script::new(|_| {
            OperatorResponse::new(RequestId::new(), ApprovalDecision::Approve)
        }));
        let err = decide(&h, &ToolCall::new("bash")).await.unwrap_err();
        assert!(matches!(err, ApprovalError::InvalidOperatorResponse(_)));
    }

    #[tokio::test]
    async fn test_choice_not_offered_is_invalid() {
        let h = human(Script::new(|id| {
            OperatorResponse::new(id, ApprovalDecision::Terminate)
        }))
        .with_choices(vec![ApprovalDecision::Approve, ApprovalDecision::Reject])
        .unwrap();
        let err = decide(&h, &ToolCall::new("bash")).await.unwrap_err();
        assert!(matches!(err, ApprovalError::InvalidOperatorResponse(_)));
    }

    #[tokio::test]
    async fn test_closed_channel_fails() {
        let (queue, inbox) = OperatorQueue::new();
        drop(inbox);
        let h = human(Arc::new(queue));
        let err = decide(&h, &ToolCall::new("bash")).await.unwrap_err();
        assert!(matches!(err, ApprovalError::HumanChannelClosed));
    }

    #[tokio::test]
    async fn test_presentation_is_serialized() {
        let channel = Arc::new(Overlap::default());
        let lock = PresentationLock::new();
        let a = HumanApprover::new(channel.clone(), lock.clone());
        let b = HumanApprover::new(channel.clone(), lock);

        let call = ToolCall::new("bash");
        let (ra, rb) = tokio::join!(decide(&a, &call), decide(&b, &call));
        assert!(ra.is_ok() && rb.is_ok());
        assert_eq!(channel.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sample_key_is_forwarded() {
        let (queue, mut inbox) = OperatorQueue::new();
        let h = human(Arc::new(queue));
        let operator = tokio::spawn(async move {
            let prompt = inbox.next().await.unwrap();
            let sample = prompt.request().sample.clone();
            prompt.answer(ApprovalDecision::Approve, "ok").unwrap();
            sample
        });
        let state = TaskState::new("task", "s1");
        h.decide("", &ToolCall::new("bash"), &ToolCallView::default(), Some(&state))
            .await
            .unwrap();
        assert_eq!(operator.await.unwrap().as_deref(), Some("task/s1/1"));
    }

    #[test]
    fn test_from_params() {
        let (queue, _inbox) = OperatorQueue::new();
        let params = json!({"choices": ["approve", "reject"]})
            .as_object()
            .cloned()
            .unwrap();
        let h = HumanApprover::from_params("human", &params, Arc::new(queue.clone()), PresentationLock::new())
            .unwrap();
        assert_eq!(h.params(), params);

        let bad = json!({"choices": []}).as_object().cloned().unwrap();
        assert!(
            HumanApprover::from_params("human", &bad, Arc::new(queue.clone()), PresentationLock::new())
                .is_err()
        );
        let unknown = json!({"timeout": 3}).as_object().cloned().unwrap();
        assert!(
            HumanApprover::from_params("human", &unknown, Arc::new(queue), PresentationLock::new())
                .is_err()
        );
    }
}

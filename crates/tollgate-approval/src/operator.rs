//! Request/response channel between human approvers and an interactive operator.
//!
//! Every pending call gets its own [`oneshot`] responder, so answers can
//! never be delivered to the wrong caller. Frontends either implement
//! [`OperatorChannel`] directly (a terminal prompt) or drain an
//! [`OperatorInbox`] fed by an [`OperatorQueue`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use tollgate_core::{
    ApprovalDecision, ToolArguments, ToolCall, ToolCallContent, ToolCallView,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApprovalError, ApprovalResult};

/// Number of prompts an [`OperatorQueue`] buffers before senders wait.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Unique identifier for an operator prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new random request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prompt:{}", self.0)
    }
}

/// A tool call presented to the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorRequest {
    /// Identifier the response must echo.
    pub id: RequestId,
    /// Assistant message that issued the call.
    pub message: String,
    /// The call under review.
    pub call: ToolCall,
    /// Tool-specific rendering, possibly empty.
    pub view: ToolCallView,
    /// Key of the sample the call belongs to, if any.
    pub sample: Option<String>,
    /// Decisions the operator may choose from.
    pub choices: Vec<ApprovalDecision>,
    /// When the prompt was created.
    pub requested_at: DateTime<Utc>,
}

impl OperatorRequest {
    /// Create a prompt offering every decision.
    #[must_use]
    pub fn new(message: impl Into<String>, call: ToolCall, view: ToolCallView) -> Self {
        Self {
            id: RequestId::new(),
            message: message.into(),
            call,
            view,
            sample: None,
            choices: ApprovalDecision::ALL.to_vec(),
            requested_at: Utc::now(),
        }
    }

    /// Attach the sample key.
    #[must_use]
    pub fn with_sample(mut self, sample: impl Into<String>) -> Self {
        self.sample = Some(sample.into());
        self
    }

    /// Restrict the offered decisions.
    #[must_use]
    pub fn with_choices(mut self, choices: Vec<ApprovalDecision>) -> Self {
        self.choices = choices;
        self
    }

    /// What to show as the call: the viewer's rendering, or a default one.
    #[must_use]
    pub fn call_content(&self) -> ToolCallContent {
        self.view.call_content(&self.call)
    }

    /// Whether `decision` is among the offered choices.
    #[must_use]
    pub fn offers(&self, decision: ApprovalDecision) -> bool {
        self.choices.contains(&decision)
    }
}

/// The operator's answer to one [`OperatorRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorResponse {
    /// The request this answers.
    pub request_id: RequestId,
    /// Chosen decision.
    pub decision: ApprovalDecision,
    /// Free-text justification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Replacement arguments, required for `modify`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<ToolArguments>,
}

impl OperatorResponse {
    /// Create a response with no explanation.
    #[must_use]
    pub fn new(request_id: RequestId, decision: ApprovalDecision) -> Self {
        Self {
            request_id,
            decision,
            explanation: None,
            arguments: None,
        }
    }

    /// Attach an explanation.
    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Attach replacement arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: ToolArguments) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// Presents prompts to an interactive operator.
///
/// `prompt` suspends until the operator answers. Implementations return
/// [`ApprovalError::HumanChannelClosed`] when the operator goes away.
#[async_trait]
pub trait OperatorChannel: Send + Sync {
    /// Present `request` and wait for the answer.
    async fn prompt(&self, request: OperatorRequest) -> ApprovalResult<OperatorResponse>;
}

/// A prompt waiting in an [`OperatorInbox`].
#[derive(Debug)]
pub struct PendingPrompt {
    request: OperatorRequest,
    responder: oneshot::Sender<OperatorResponse>,
}

impl PendingPrompt {
    /// The prompt to present.
    #[must_use]
    pub fn request(&self) -> &OperatorRequest {
        &self.request
    }

    /// Whether the waiting caller has gone away.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.responder.is_closed()
    }

    /// Deliver the operator's answer.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::HumanChannelClosed`] if the caller stopped
    /// waiting in the meantime.
    pub fn respond(self, response: OperatorResponse) -> ApprovalResult<()> {
        self.responder
            .send(response)
            .map_err(|_| ApprovalError::HumanChannelClosed)
    }

    /// Answer with a decision and explanation.
    ///
    /// # Errors
    ///
    /// See [`PendingPrompt::respond`].
    pub fn answer(
        self,
        decision: ApprovalDecision,
        explanation: impl Into<String>,
    ) -> ApprovalResult<()> {
        let response =
            OperatorResponse::new(self.request.id, decision).with_explanation(explanation);
        self.respond(response)
    }
}

/// Sending half: an [`OperatorChannel`] that forwards prompts to an inbox.
#[derive(Debug, Clone)]
pub struct OperatorQueue {
    tx: mpsc::Sender<PendingPrompt>,
}

impl OperatorQueue {
    /// Create a queue and its inbox.
    #[must_use]
    pub fn new() -> (Self, OperatorInbox) {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a queue buffering up to `capacity` prompts.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, OperatorInbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, OperatorInbox { rx })
    }
}

#[async_trait]
impl OperatorChannel for OperatorQueue {
    async fn prompt(&self, request: OperatorRequest) -> ApprovalResult<OperatorResponse> {
        let (responder, answer) = oneshot::channel();
        self.tx
            .send(PendingPrompt { request, responder })
            .await
            .map_err(|_| ApprovalError::HumanChannelClosed)?;
        answer.await.map_err(|_| ApprovalError::HumanChannelClosed)
    }
}

/// Receiving half, drained by the operator frontend.
#[derive(Debug)]
pub struct OperatorInbox {
    rx: mpsc::Receiver<PendingPrompt>,
}

impl OperatorInbox {
    /// Next prompt whose caller is still waiting.
    ///
    /// Returns `None` once every [`OperatorQueue`] has been dropped.
    pub async fn next(&mut self) -> Option<PendingPrompt> {
        loop {
            let prompt = self.rx.recv().await?;
            if prompt.is_abandoned() {
                debug!(request_id = %prompt.request.id, "Skipping abandoned prompt");
                continue;
            }
            return Some(prompt);
        }
    }

    /// Stop accepting prompts. Pending and future callers fail with
    /// [`ApprovalError::HumanChannelClosed`].
    pub fn close(&mut self) {
        self.rx.close();
        // Buffered prompts would otherwise keep their callers waiting.
        while let Ok(prompt) = self.rx.try_recv() {
            debug!(request_id = %prompt.request.id, "Dropping prompt on close");
        }
    }

    /// Number of prompts waiting, including abandoned ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no prompt is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(function: &str) -> OperatorRequest {
        OperatorRequest::new("", ToolCall::new(function), ToolCallView::default())
    }

    #[tokio::test]
    async fn test_queue_round_trip() {
        let (queue, mut inbox) = OperatorQueue::new();
        let operator = tokio::spawn(async move {
            let prompt = inbox.next().await.unwrap();
            assert_eq!(prompt.request().call.function, "bash");
            prompt.answer(ApprovalDecision::Reject, "no").unwrap();
        });

        let response = queue.prompt(request("bash")).await.unwrap();
        assert_eq!(response.decision, ApprovalDecision::Reject);
        assert_eq!(response.explanation.as_deref(), Some("no"));
        operator.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_prompt_is_channel_closed() {
        let (queue, mut inbox) = OperatorQueue::new();
        let operator = tokio::spawn(async move {
            let prompt = inbox.next().await.unwrap();
            drop(prompt);
        });
        let err = queue.prompt(request("bash")).await.unwrap_err();
        assert!(matches!(err, ApprovalError::HumanChannelClosed));
        operator.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_inbox_is_channel_closed() {
        let (queue, inbox) = OperatorQueue::new();
        drop(inbox);
        let err = queue.prompt(request("bash")).await.unwrap_err();
        assert!(matches!(err, ApprovalError::HumanChannelClosed));
    }

    #[tokio::test]
    async fn test_close_fails_buffered_prompts() {
        let (queue, mut inbox) = OperatorQueue::new();
        let waiting = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.prompt(request("bash")).await })
        };
        while inbox.is_empty() {
            tokio::task::yield_now().await;
        }

        inbox.close();
        assert!(inbox.is_empty());
        let err = tokio::time::timeout(std::time::Duration::from_secs(5), waiting)
            .await
            .unwrap()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, ApprovalError::HumanChannelClosed));

        let late = queue.prompt(request("python")).await.unwrap_err();
        assert!(matches!(late, ApprovalError::HumanChannelClosed));
        assert!(inbox.next().await.is_none());
    }

    #[tokio::test]
    async fn test_inbox_skips_abandoned_prompts() {
        let (queue, mut inbox) = OperatorQueue::new();

        // Caller gives up before the operator looks at the prompt.
        let abandoned = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.prompt(request("first")).await })
        };
        while inbox.is_empty() {
            tokio::task::yield_now().await;
        }
        abandoned.abort();
        let _ = abandoned.await;

        let live = tokio::spawn(async move { queue.prompt(request("second")).await });
        let prompt = inbox.next().await.unwrap();
        assert_eq!(prompt.request().call.function, "second");
        prompt.answer(ApprovalDecision::Approve, "ok").unwrap();
        assert_eq!(
            live.await.unwrap().unwrap().decision,
            ApprovalDecision::Approve
        );
    }

    #[test]
    fn test_request_defaults() {
        let req = request("bash").with_sample("t/1/1");
        assert_eq!(req.choices.len(), 5);
        assert!(req.offers(ApprovalDecision::Modify));
        assert_eq!(req.sample.as_deref(), Some("t/1/1"));
        assert!(req.call_content().content.starts_with("bash"));
        assert!(req.id.to_string().starts_with("prompt:"));
    }

    #[test]
    fn test_response_serde() {
        let response = OperatorResponse::new(RequestId::new(), ApprovalDecision::Escalate);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["decision"], "escalate");
        assert!(json.get("explanation").is_none());
    }
}

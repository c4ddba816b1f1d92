//! Mock approvers and a scripted operator.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tollgate_approval::{
    ApprovalError, ApprovalResult, Approver, OperatorInbox, OperatorRequest, OperatorResponse,
};
use tollgate_core::{Approval, ApprovalDecision, TaskState, ToolArguments, ToolCall, ToolCallView};

/// Order in which approvers were invoked, shared across mocks.
#[derive(Debug, Clone, Default)]
pub struct InvocationLog(Arc<Mutex<Vec<String>>>);

impl InvocationLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name`.
    pub fn record(&self, name: &str) {
        if let Ok(mut guard) = self.0.lock() {
            guard.push(name.to_owned());
        }
    }

    /// Names recorded so far, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

/// Approver returning queued approvals, then a default.
///
/// Uses `std::sync::Mutex` internally so builders work without a runtime.
#[derive(Debug, Clone)]
pub struct ScriptedApprover {
    name: String,
    responses: Arc<Mutex<VecDeque<Approval>>>,
    default: Approval,
    calls: Arc<Mutex<Vec<ToolCall>>>,
    log: Option<InvocationLog>,
    delay: Option<Duration>,
}

impl ScriptedApprover {
    /// Create an approver that escalates unless told otherwise.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            default: Approval::escalate("no scripted response"),
            calls: Arc::new(Mutex::new(Vec::new())),
            log: None,
            delay: None,
        }
    }

    /// Queue an approval.
    #[must_use]
    pub fn with_response(self, approval: Approval) -> Self {
        if let Ok(mut guard) = self.responses.lock() {
            guard.push_back(approval);
        }
        self
    }

    /// Set the approval returned once the queue is empty.
    #[must_use]
    pub fn with_default(mut self, approval: Approval) -> Self {
        self.default = approval;
        self
    }

    /// Record invocations in `log`.
    #[must_use]
    pub fn with_log(mut self, log: &InvocationLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Sleep before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Share as a trait object. Clones keep sharing the call record.
    #[must_use]
    pub fn shared(&self) -> Arc<dyn Approver> {
        Arc::new(self.clone())
    }

    /// Number of times `decide` ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|g| g.len()).unwrap_or(0)
    }

    /// Calls seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Approver for ScriptedApprover {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide(
        &self,
        _message: &str,
        call: &ToolCall,
        _view: &ToolCallView,
        _state: Option<&TaskState>,
    ) -> ApprovalResult<Approval> {
        if let Ok(mut guard) = self.calls.lock() {
            guard.push(call.clone());
        }
        if let Some(log) = &self.log {
            log.record(&self.name);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().ok().and_then(|mut g| g.pop_front());
        Ok(next.unwrap_or_else(|| self.default.clone()))
    }
}

/// Approver that always fails.
#[derive(Debug, Clone)]
pub struct FailingApprover {
    name: String,
    message: String,
}

impl FailingApprover {
    /// Create an approver failing with `message`.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Approver for FailingApprover {
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
        Err(ApprovalError::approver_failed(&self.name, &self.message))
    }
}

/// Approver that never answers.
#[derive(Debug, Clone)]
pub struct PendingApprover {
    name: String,
    invoked: Arc<Notify>,
}

impl PendingApprover {
    /// Create a pending approver.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            invoked: Arc::new(Notify::new()),
        }
    }

    /// Wait until `decide` has been entered.
    pub async fn invoked(&self) {
        self.invoked.notified().await;
    }
}

#[async_trait]
impl Approver for PendingApprover {
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
        self.invoked.notify_one();
        std::future::pending().await
    }
}

/// Answer scripted for one function.
#[derive(Debug, Clone)]
struct ScriptedAnswer {
    decision: ApprovalDecision,
    explanation: Option<String>,
    arguments: Option<ToolArguments>,
}

type Responder = Arc<dyn Fn(&OperatorRequest) -> OperatorResponse + Send + Sync>;

/// Operator that answers [`OperatorInbox`] prompts from a script keyed by
/// function name.
#[derive(Clone)]
pub struct ScriptedOperator {
    answers: HashMap<String, ScriptedAnswer>,
    fallback: Option<Responder>,
    delay: Option<Duration>,
}

impl ScriptedOperator {
    /// Create an operator that rejects anything unscripted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            fallback: None,
            delay: None,
        }
    }

    /// Answer calls to `function` with `decision`.
    #[must_use]
    pub fn answer(
        mut self,
        function: impl Into<String>,
        decision: ApprovalDecision,
        explanation: impl Into<String>,
    ) -> Self {
        self.answers.insert(
            function.into(),
            ScriptedAnswer {
                decision,
                explanation: Some(explanation.into()),
                arguments: None,
            },
        );
        self
    }

    /// Answer calls to `function` with `modify` and replacement arguments.
    #[must_use]
    pub fn modify(mut self, function: impl Into<String>, arguments: ToolArguments) -> Self {
        self.answers.insert(
            function.into(),
            ScriptedAnswer {
                decision: ApprovalDecision::Modify,
                explanation: None,
                arguments: Some(arguments),
            },
        );
        self
    }

    /// Compute answers for unscripted functions.
    #[must_use]
    pub fn otherwise<F>(mut self, responder: F) -> Self
    where
        F: Fn(&OperatorRequest) -> OperatorResponse + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(responder));
        self
    }

    /// Think for `delay` before each answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Response to `request` according to the script.
    #[must_use]
    pub fn response_for(&self, request: &OperatorRequest) -> OperatorResponse {
        if let Some(answer) = self.answers.get(&request.call.function) {
            return OperatorResponse {
                request_id: request.id,
                decision: answer.decision,
                explanation: answer.explanation.clone(),
                arguments: answer.arguments.clone(),
            };
        }
        match &self.fallback {
            Some(responder) => responder(request),
            None => OperatorResponse::new(request.id, ApprovalDecision::Reject)
                .with_explanation("not scripted"),
        }
    }

    /// Answer prompts until every queue feeding `inbox` is dropped.
    ///
    /// Returns the prompts answered, in order.
    pub async fn run(self, mut inbox: OperatorInbox) -> Vec<OperatorRequest> {
        let mut seen = Vec::new();
        while let Some(prompt) = inbox.next().await {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let request = prompt.request().clone();
            let response = self.response_for(&request);
            // The caller may have been cancelled while we were thinking.
            let _ = prompt.respond(response);
            seen.push(request);
        }
        seen
    }
}

impl Default for ScriptedOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedOperator")
            .field("answers", &self.answers)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

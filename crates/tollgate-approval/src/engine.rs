//! Per-run approval engine and per-sample handles.
//!
//! The engine fixes the active chain once, owns the run's cancellation
//! token and publishes an [`ApprovalEvent`] for every resolution. Each
//! sample key gets one token, a child of the run token, shared by every
//! [`SampleApprovals`] handle for that key while any of them is alive. A
//! `terminate` in one sample therefore abandons that sample's other
//! pending calls without touching any other sample.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tollgate_core::{Approval, ApprovalDecision, TaskState, ToolCall, ToolCallView, ToolCallViewer};
use tracing::{Instrument, debug, info_span, trace, warn};
use uuid::Uuid;

use crate::error::{ApprovalError, ApprovalResult};
use crate::policy::PolicyChain;
use crate::resolver::{Resolution, resolve_detailed};
use crate::scope::{ChainScope, select};

/// Default capacity of the approval event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Explanation returned when approval is disabled.
pub const APPROVAL_NOT_REQUIRED: &str = "approval not required";

type Viewers = HashMap<String, Arc<dyn ToolCallViewer>>;
type SampleTokens = HashMap<String, Weak<CancellationToken>>;

/// Record of one completed resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalEvent {
    /// Event identifier.
    pub id: Uuid,
    /// When the decision was reached.
    pub timestamp: DateTime<Utc>,
    /// Key of the sample the call belongs to.
    pub sample_id: String,
    /// The call as issued.
    pub call: ToolCall,
    /// Signature the chain was matched against.
    pub signature: String,
    /// Approver that decided; absent for no-match and exhaustion.
    pub approver: Option<String>,
    /// The decision.
    pub approval: Approval,
}

impl ApprovalEvent {
    fn new(state: &TaskState, call: &ToolCall, resolution: &Resolution) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sample_id: state.key(),
            call: call.clone(),
            signature: call.signature(),
            approver: resolution.approver.clone(),
            approval: resolution.approval.clone(),
        }
    }
}

/// Approval for one run.
pub struct ApprovalEngine {
    chain: Option<(Arc<PolicyChain>, ChainScope)>,
    viewers: Arc<Viewers>,
    events: broadcast::Sender<Arc<ApprovalEvent>>,
    run: CancellationToken,
    samples: Mutex<SampleTokens>,
}

impl ApprovalEngine {
    /// Create an engine; a run-level chain supersedes the task-level one.
    #[must_use]
    pub fn new(run: Option<Arc<PolicyChain>>, task: Option<Arc<PolicyChain>>) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            chain: select(run, task),
            viewers: Arc::new(Viewers::new()),
            events,
            run: CancellationToken::new(),
            samples: Mutex::new(SampleTokens::new()),
        }
    }

    /// Engine with approval disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None, None)
    }

    /// Render calls to `function` with `viewer`.
    #[must_use]
    pub fn with_viewer(
        mut self,
        function: impl Into<String>,
        viewer: impl ToolCallViewer + 'static,
    ) -> Self {
        Arc::make_mut(&mut self.viewers).insert(function.into(), Arc::new(viewer));
        self
    }

    /// Whether calls are reviewed at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.chain.is_some()
    }

    /// The active chain.
    #[must_use]
    pub fn chain(&self) -> Option<&Arc<PolicyChain>> {
        self.chain.as_ref().map(|(chain, _)| chain)
    }

    /// Where the active chain came from.
    #[must_use]
    pub fn scope(&self) -> Option<ChainScope> {
        self.chain.as_ref().map(|(_, scope)| *scope)
    }

    /// Receive an event for every completed resolution.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ApprovalEvent>> {
        self.events.subscribe()
    }

    /// Handle for the calls of one sample.
    ///
    /// Handles created for the same [`TaskState::key`] share one token while
    /// any of them is alive, so a `terminate` through one cancels calls
    /// pending on all of them. Once every handle is dropped the next handle
    /// for that key starts fresh.
    #[must_use]
    pub fn sample(&self, state: TaskState) -> SampleApprovals {
        let token = self.sample_token(&state.key());
        SampleApprovals {
            state: Arc::new(state),
            chain: self.chain().cloned(),
            viewers: Arc::clone(&self.viewers),
            events: self.events.clone(),
            run: self.run.clone(),
            token,
        }
    }

    fn sample_token(&self, key: &str) -> Arc<CancellationToken> {
        let mut live = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = live.get(key).and_then(Weak::upgrade) {
            return token;
        }
        live.retain(|_, token| token.strong_count() > 0);
        let token = Arc::new(self.run.child_token());
        live.insert(key.to_owned(), Arc::downgrade(&token));
        token
    }

    /// Abandon every pending resolution in every sample.
    pub fn cancel_run(&self) {
        warn!("Cancelling approval for the run");
        self.run.cancel();
    }

    /// Whether the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.run.is_cancelled()
    }
}

impl fmt::Debug for ApprovalEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApprovalEngine")
            .field("scope", &self.scope())
            .field("policies", &self.chain().map(|c| c.len()))
            .field("viewers", &self.viewers.keys().collect::<Vec<_>>())
            .field("cancelled", &self.run.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Approval handle for one sample. Clones, and other handles for the same
/// sample key, share the sample's token.
#[derive(Clone)]
pub struct SampleApprovals {
    state: Arc<TaskState>,
    chain: Option<Arc<PolicyChain>>,
    viewers: Arc<Viewers>,
    events: broadcast::Sender<Arc<ApprovalEvent>>,
    run: CancellationToken,
    token: Arc<CancellationToken>,
}

impl SampleApprovals {
    /// Resolve `call`, issued by assistant `message`.
    ///
    /// A `terminate` decision is returned to this caller and cancels every
    /// other pending call of the sample.
    ///
    /// # Errors
    ///
    /// [`ApprovalError::Cancelled`] if the sample or run is cancelled before
    /// a decision is reached, or any approver failure.
    pub async fn approve(&self, message: &str, call: &ToolCall) -> ApprovalResult<Approval> {
        let Some(chain) = &self.chain else {
            return Ok(Approval::approve(APPROVAL_NOT_REQUIRED));
        };
        if self.token.is_cancelled() {
            return Err(self.cancelled());
        }

        let view = self.view(call);
        let span = info_span!(
            "approval",
            sample_id = %self.state.key(),
            call_id = %call.id,
            function = %call.function
        );
        let resolving =
            resolve_detailed(chain, message, call, &view, Some(self.state.as_ref())).instrument(span);
        let resolution = tokio::select! {
            biased;
            () = self.token.cancelled() => {
                debug!(sample_id = %self.state.key(), call_id = %call.id, "Pending approval abandoned");
                return Err(self.cancelled());
            },
            resolution = resolving => resolution?,
        };

        if resolution.approval.decision == ApprovalDecision::Terminate {
            warn!(sample_id = %self.state.key(), "Terminating sample");
            self.token.cancel();
        }
        self.publish(ApprovalEvent::new(&self.state, call, &resolution));
        Ok(resolution.approval)
    }

    /// The view presented to approvers for `call`.
    #[must_use]
    pub fn view(&self, call: &ToolCall) -> ToolCallView {
        self.viewers
            .get(&call.function)
            .map(|viewer| viewer.view(call))
            .unwrap_or_default()
    }

    /// Cancel every pending call of this sample.
    pub fn terminate(&self) {
        self.token.cancel();
    }

    /// Whether the sample was terminated or the run cancelled.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The sample's state.
    #[must_use]
    pub fn state(&self) -> &TaskState {
        &self.state
    }

    fn cancelled(&self) -> ApprovalError {
        let reason = if self.run.is_cancelled() {
            "run cancelled"
        } else {
            "sample terminated"
        };
        ApprovalError::Cancelled {
            reason: reason.to_owned(),
        }
    }

    fn publish(&self, event: ApprovalEvent) {
        match self.events.send(Arc::new(event)) {
            Ok(receivers) => trace!(receivers, "Approval event published"),
            Err(_) => trace!("No receivers for approval event"),
        }
    }
}

impl fmt::Debug for SampleApprovals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleApprovals")
            .field("sample_id", &self.state.key())
            .field("enabled", &self.chain.is_some())
            .field("terminated", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

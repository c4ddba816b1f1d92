//! Escalation walk over a policy chain.
//!
//! 1. Collect the policies whose patterns match the call's signature.
//! 2. No candidates: reject.
//! 3. Ask each candidate in order. `escalate` moves on; any other decision
//!    is returned as is.
//! 4. Every candidate escalated: reject.
//!
//! An approver error aborts the walk and is returned to the caller. So does
//! a `modify` without a replacement call; a replacement attached to any
//! other decision is dropped.

use tollgate_core::{Approval, ApprovalDecision, TaskState, ToolCall, ToolCallView};
use tracing::{debug, info, warn};

use crate::error::{ApprovalError, ApprovalResult};
use crate::policy::PolicyChain;

/// Explanation when no policy matches the call.
pub const NO_MATCH_EXPLANATION: &str = "no approver configured for this tool call";

/// Explanation when every matching approver escalated.
pub const EXHAUSTED_EXPLANATION: &str = "chain exhausted without a decision";

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The final approval.
    pub approval: Approval,
    /// Approver that produced it; `None` for no-match and exhaustion.
    pub approver: Option<String>,
    /// Number of approvers invoked.
    pub consulted: usize,
}

/// Resolve `call` against `chain`.
///
/// # Errors
///
/// Propagates the first approver failure.
pub async fn resolve(
    chain: &PolicyChain,
    message: &str,
    call: &ToolCall,
    view: &ToolCallView,
    state: Option<&TaskState>,
) -> ApprovalResult<Approval> {
    resolve_detailed(chain, message, call, view, state)
        .await
        .map(|resolution| resolution.approval)
}

/// Like [`resolve`], also reporting which approver decided.
///
/// # Errors
///
/// Propagates the first approver failure.
pub async fn resolve_detailed(
    chain: &PolicyChain,
    message: &str,
    call: &ToolCall,
    view: &ToolCallView,
    state: Option<&TaskState>,
) -> ApprovalResult<Resolution> {
    let signature = call.signature();
    let sample_id = state.map(TaskState::key);
    let mut consulted: usize = 0;

    for policy in chain.candidates(&signature) {
        let approver = policy.approver();
        consulted = consulted.saturating_add(1);
        debug!(
            %signature,
            approver = approver.name(),
            sample_id = sample_id.as_deref(),
            "Invoking approver"
        );

        let decided = approver
            .decide(message, call, view, state)
            .await
            .and_then(|approval| well_formed(approver.name(), approval));
        let approval = match decided {
            Ok(approval) => approval,
            Err(e) => {
                warn!(
                    %signature,
                    approver = approver.name(),
                    sample_id = sample_id.as_deref(),
                    error = %e,
                    "Approver failed"
                );
                return Err(e);
            },
        };

        match approval.decision {
            ApprovalDecision::Escalate => {
                debug!(
                    %signature,
                    approver = approver.name(),
                    explanation = approval.explanation(),
                    "Approver escalated"
                );
            },
            ApprovalDecision::Terminate => {
                warn!(
                    %signature,
                    approver = approver.name(),
                    sample_id = sample_id.as_deref(),
                    explanation = approval.explanation(),
                    "Approver terminated sample"
                );
                return Ok(Resolution {
                    approval,
                    approver: Some(approver.name().to_owned()),
                    consulted,
                });
            },
            decision => {
                info!(
                    %signature,
                    approver = approver.name(),
                    sample_id = sample_id.as_deref(),
                    %decision,
                    "Tool call resolved"
                );
                return Ok(Resolution {
                    approval,
                    approver: Some(approver.name().to_owned()),
                    consulted,
                });
            },
        }
    }

    let explanation = if consulted == 0 {
        warn!(%signature, sample_id = sample_id.as_deref(), "No approver matches tool call");
        NO_MATCH_EXPLANATION
    } else {
        warn!(
            %signature,
            sample_id = sample_id.as_deref(),
            consulted,
            "Every approver escalated"
        );
        EXHAUSTED_EXPLANATION
    };
    Ok(Resolution {
        approval: Approval::reject(explanation),
        approver: None,
        consulted,
    })
}

/// Only `modify` carries a replacement call, and it always does.
fn well_formed(approver: &str, mut approval: Approval) -> ApprovalResult<Approval> {
    match approval.decision {
        ApprovalDecision::Modify if approval.modified.is_none() => Err(
            ApprovalError::approver_failed(approver, "returned 'modify' without a replacement call"),
        ),
        ApprovalDecision::Modify => Ok(approval),
        decision => {
            if approval.modified.take().is_some() {
                debug!(approver, %decision, "Dropping replacement call from non-modify decision");
            }
            Ok(approval)
        },
    }
}

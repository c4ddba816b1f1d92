//! Test fixtures for common types.

use std::sync::Arc;
use tollgate_approval::{ApprovalPolicy, Approver, PolicyChain};
use tollgate_core::{TaskState, ToolCall};

/// Task name used by [`test_state`].
pub const TEST_TASK: &str = "test_task";

/// Create a call to `function` with no arguments and a fixed id.
#[must_use]
pub fn test_call(function: impl Into<String>) -> ToolCall {
    ToolCall::new(function).with_id("call_test")
}

/// Create a `bash` call running `cmd`.
#[must_use]
pub fn bash_call(cmd: &str) -> ToolCall {
    test_call("bash").with_arg("cmd", cmd)
}

/// Create sample state for `sample_id` in [`TEST_TASK`].
#[must_use]
pub fn test_state(sample_id: impl Into<String>) -> TaskState {
    TaskState::new(TEST_TASK, sample_id)
}

/// Build a shared chain from approvers and their patterns.
///
/// # Panics
///
/// Panics if a pattern list is empty or contains an empty pattern.
#[must_use]
pub fn test_chain(policies: Vec<(Arc<dyn Approver>, Vec<&str>)>) -> Arc<PolicyChain> {
    let policies = policies
        .into_iter()
        .map(|(approver, tools)| {
            ApprovalPolicy::new(approver, tools).expect("test policy patterns must be valid")
        })
        .collect();
    Arc::new(PolicyChain::new(policies))
}

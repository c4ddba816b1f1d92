//! Run-level versus task-level chain selection.

use std::sync::Arc;
use tracing::debug;

use crate::policy::PolicyChain;

/// Where the active chain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainScope {
    /// Supplied for the whole run.
    Run,
    /// Attached to the task.
    Task,
}

/// Pick the active chain.
///
/// A run-level chain is used exclusively whenever present; the task-level
/// chain is only consulted without one. Chains are never merged. `None`
/// disables approval.
#[must_use]
pub fn select(
    run: Option<Arc<PolicyChain>>,
    task: Option<Arc<PolicyChain>>,
) -> Option<(Arc<PolicyChain>, ChainScope)> {
    let selected = match (run, task) {
        (Some(run), task) => {
            if task.is_some() {
                debug!("Run-level approval chain overrides task-level chain");
            }
            Some((run, ChainScope::Run))
        },
        (None, Some(task)) => Some((task, ChainScope::Task)),
        (None, None) => None,
    };
    if selected.is_none() {
        debug!("No approval chain; approval disabled");
    }
    selected
}

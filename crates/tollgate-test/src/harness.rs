//! Test harness helpers.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tollgate_approval::{OperatorChannel, OperatorQueue, OperatorRequest};
use tracing_subscriber::EnvFilter;

use crate::mocks::ScriptedOperator;

/// Install a test-friendly subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `debug` for tollgate crates.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tollgate_approval=debug,tollgate_config=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Start `script` behind a fresh [`OperatorQueue`].
///
/// Returns the channel to hand to the approver registry and the operator
/// task, which yields every prompt it answered once all channel clones are
/// dropped.
#[must_use]
pub fn operator(
    script: ScriptedOperator,
) -> (Arc<dyn OperatorChannel>, JoinHandle<Vec<OperatorRequest>>) {
    let (queue, inbox) = OperatorQueue::new();
    let task = tokio::spawn(script.run(inbox));
    (Arc::new(queue), task)
}

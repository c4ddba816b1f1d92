//! `tollgate resolve`: run one tool call through a policy chain.

use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tollgate_approval::{ApprovalEngine, PolicyChain};
use tollgate_config::ApprovalSelection;
use tollgate_core::{Approval, TaskState, ToolArguments, ToolCall};
use tracing::debug;

use crate::theme::Theme;

/// Parse `name=value`. Values that parse as JSON are kept as JSON, anything
/// else becomes a string.
pub(crate) fn parse_arg(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("argument name missing in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((name.to_owned(), value))
}

/// Build a call from the command line.
pub(crate) fn tool_call(function: &str, args: Vec<(String, Value)>) -> ToolCall {
    ToolCall::new(function).with_arguments(args.into_iter().collect::<ToolArguments>())
}

/// Resolve `call` against `selection` and return the approval.
pub(crate) async fn run(
    selection: &ApprovalSelection,
    call: &ToolCall,
    message: &str,
) -> Result<Approval> {
    let config = selection
        .resolve()
        .with_context(|| format!("failed to load approval policy '{selection}'"))?;
    let chain = PolicyChain::from_config(&config, &super::registry())
        .context("failed to build policy chain")?;

    debug!(signature = %call.signature(), "Resolving tool call");

    let engine = ApprovalEngine::new(Some(Arc::new(chain)), None);
    let sample = engine.sample(TaskState::new("cli", "1"));

    tokio::select! {
        approval = sample.approve(message, call) => Ok(approval?),
        _ = tokio::signal::ctrl_c() => {
            engine.cancel_run();
            anyhow::bail!("interrupted while waiting for a decision")
        },
    }
}

/// One-line summary of an approval.
pub(crate) fn describe(call_signature: &str, approval: &Approval) -> String {
    let mut line = format!(
        "{} {}  {}",
        Theme::decision(approval.decision),
        call_signature,
        Theme::dimmed(approval.explanation())
    );
    if let Some(modified) = &approval.modified {
        line.push_str(&format!("\n  -> {}", modified.signature()));
    }
    line
}

//! Subcommand implementations.

pub(crate) mod check;
pub(crate) mod resolve;

use std::sync::Arc;
use tollgate_approval::ApproverRegistry;

use crate::operator::TerminalOperator;

/// Built-in approvers, with `human` prompting at this terminal.
pub(crate) fn registry() -> ApproverRegistry {
    ApproverRegistry::with_builtins(Some(Arc::new(TerminalOperator)))
}

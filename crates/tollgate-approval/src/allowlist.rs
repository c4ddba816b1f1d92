//! Shell command allowlist approver.
//!
//! Approves shell tool calls whose every program is on a configured list and
//! escalates everything else, so a later policy (usually `human`) decides.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tollgate_config::ApproverParams;
use tollgate_core::{Approval, TaskState, ToolCall, ToolCallView};
use tracing::debug;

use crate::approver::Approver;
use crate::error::{ApprovalError, ApprovalResult};

/// Substitution and redirection are never approved automatically.
const ALWAYS_ESCALATE: &[&str] = &["`", "$(", "<(", ">(", ">", "<"];

/// Operators separating commands in a pipeline or list.
const CHAIN_OPERATORS: &[&str] = &["&&", "||", ";", "|", "&", "\n"];

fn default_argument() -> String {
    "cmd".to_owned()
}

/// Construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllowlistParams {
    /// Program names that may run without review.
    pub allowed_commands: BTreeSet<String>,
    /// Tool argument holding the command line.
    #[serde(default = "default_argument")]
    pub argument: String,
    /// Accept `a && b`, `a | b` etc. when every program is allowed.
    #[serde(default)]
    pub allow_chaining: bool,
}

/// Approves shell commands built only from allowlisted programs.
#[derive(Debug, Clone)]
pub struct CommandAllowlistApprover {
    name: String,
    params: AllowlistParams,
}

impl CommandAllowlistApprover {
    /// Create an approver registered under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, params: AllowlistParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Build from policy parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidParameters`] when `allowed_commands` is
    /// missing or a key is unknown or ill-typed.
    pub fn from_params(name: &str, params: &ApproverParams) -> ApprovalResult<Self> {
        let parsed: AllowlistParams = serde_json::from_value(Value::Object(params.clone()))
            .map_err(|e| ApprovalError::InvalidParameters {
                approver: name.to_owned(),
                message: e.to_string(),
            })?;
        Ok(Self::new(name, parsed))
    }

    /// Decide on a raw command line.
    fn judge(&self, command: &str) -> Approval {
        if let Some(token) = ALWAYS_ESCALATE.iter().find(|t| command.contains(**t)) {
            return Approval::escalate(format!("command uses '{}'", token.escape_default()));
        }

        let segments = if self.params.allow_chaining {
            split_commands(command)
        } else if let Some(op) = CHAIN_OPERATORS.iter().find(|op| command.contains(**op)) {
            return Approval::escalate(format!(
                "command chaining with '{}' is not allowed",
                op.escape_default()
            ));
        } else {
            vec![command]
        };

        let mut programs = Vec::with_capacity(segments.len());
        for segment in segments {
            let Some(program) = segment.split_whitespace().next() else {
                continue;
            };
            if !self.params.allowed_commands.contains(program) {
                return Approval::escalate(format!("'{program}' is not in the allowlist"));
            }
            programs.push(program);
        }

        if programs.is_empty() {
            return Approval::escalate("empty command");
        }
        Approval::approve(format!("allowlisted: {}", programs.join(", ")))
    }
}

/// Split on every chain operator, longest operators first.
fn split_commands(command: &str) -> Vec<&str> {
    let mut segments = vec![command];
    for op in CHAIN_OPERATORS {
        segments = segments
            .into_iter()
            .flat_map(|segment| segment.split(op))
            .collect();
    }
    segments
}

#[async_trait]
impl Approver for CommandAllowlistApprover {
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
        let argument = &self.params.argument;
        let Some(command) = call.argument(argument).and_then(Value::as_str) else {
            return Ok(Approval::reject(format!(
                "{} call has no string '{argument}' argument",
                call.function
            )));
        };

        let approval = self.judge(command);
        debug!(
            approver = %self.name,
            command,
            decision = %approval.decision,
            "Allowlist check"
        );
        Ok(approval)
    }

    fn params(&self) -> ApproverParams {
        match serde_json::to_value(&self.params) {
            Ok(Value::Object(map)) => map,
            _ => ApproverParams::new(),
        }
    }
}

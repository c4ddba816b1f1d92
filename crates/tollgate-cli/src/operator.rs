//! Terminal operator.
//!
//! Implements [`OperatorChannel`] with `dialoguer` prompts. Prompts block,
//! so each one runs on the blocking pool.

use async_trait::async_trait;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use tollgate_approval::{ApprovalError, ApprovalResult, OperatorChannel, OperatorRequest, OperatorResponse};
use tollgate_core::{ApprovalDecision, ToolArguments};

use crate::theme::Theme;

/// Asks the person at the terminal.
#[derive(Debug, Default)]
pub(crate) struct TerminalOperator;

#[async_trait]
impl OperatorChannel for TerminalOperator {
    async fn prompt(&self, request: OperatorRequest) -> ApprovalResult<OperatorResponse> {
        tokio::task::spawn_blocking(move || ask(&request))
            .await
            .map_err(|_| ApprovalError::HumanChannelClosed)?
    }
}

fn closed(_: dialoguer::Error) -> ApprovalError {
    ApprovalError::HumanChannelClosed
}

fn ask(request: &OperatorRequest) -> ApprovalResult<OperatorResponse> {
    let theme = ColorfulTheme::default();

    println!();
    println!("{}", Theme::header("Approval required"));
    println!("{}", Theme::separator());
    if !request.message.is_empty() {
        println!("{}", Theme::dimmed(&request.message));
        println!();
    }
    println!("{}", request.call_content());
    if let Some(context) = &request.view.context {
        println!();
        println!("{context}");
    }
    println!("{}", Theme::separator());

    let labels: Vec<&str> = request.choices.iter().map(|d| d.as_str()).collect();
    let selection = Select::with_theme(&theme)
        .with_prompt("Decision")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(closed)?;
    let decision = request.choices.get(selection).copied().ok_or_else(|| {
        ApprovalError::InvalidOperatorResponse(format!("no choice at index {selection}"))
    })?;

    let explanation: String = Input::with_theme(&theme)
        .with_prompt("Explanation")
        .allow_empty(true)
        .interact_text()
        .map_err(closed)?;

    let mut response = OperatorResponse::new(request.id, decision);
    if !explanation.trim().is_empty() {
        response = response.with_explanation(explanation.trim());
    }

    if decision == ApprovalDecision::Modify {
        let current = serde_json::to_string(&request.call.arguments)
            .map_err(|e| ApprovalError::InvalidOperatorResponse(e.to_string()))?;
        let raw: String = Input::with_theme(&theme)
            .with_prompt("Arguments (JSON object)")
            .with_initial_text(current)
            .interact_text()
            .map_err(closed)?;
        let arguments: ToolArguments = serde_json::from_str(&raw)
            .map_err(|e| ApprovalError::InvalidOperatorResponse(e.to_string()))?;
        response = response.with_arguments(arguments);
    }

    Ok(response)
}

//! CLI theme and styling.

use colored::Colorize;
use tollgate_core::ApprovalDecision;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Colour a decision by what it does to the call.
    pub(crate) fn decision(decision: ApprovalDecision) -> String {
        let label = decision.as_str().to_uppercase();
        match decision {
            ApprovalDecision::Approve => label.green().bold().to_string(),
            ApprovalDecision::Modify => label.cyan().bold().to_string(),
            ApprovalDecision::Reject => label.red().bold().to_string(),
            ApprovalDecision::Escalate => label.yellow().bold().to_string(),
            ApprovalDecision::Terminate => label.red().bold().reversed().to_string(),
        }
    }
}

//! `tollgate check`: load, validate and build a policy document.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use tollgate_approval::PolicyChain;
use tollgate_config::{ApprovalPolicyConfig, DocumentFormat};

use crate::theme::Theme;

/// Build the chain in `path`; return a listing, or the document re-rendered
/// as `render` when given.
pub(crate) fn run(path: &Path, render: Option<DocumentFormat>) -> Result<String> {
    let config = ApprovalPolicyConfig::load_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let chain = PolicyChain::from_config(&config, &super::registry())
        .with_context(|| format!("failed to build policy chain from {}", path.display()))?;

    if let Some(format) = render {
        return Ok(chain.to_config().render(format)?);
    }
    Ok(describe(path, &chain))
}

fn describe(path: &Path, chain: &PolicyChain) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        Theme::success(&format!("{} ({} policies)", path.display(), chain.len()))
    );
    for (index, policy) in chain.policies().iter().enumerate() {
        let patterns: Vec<&str> = policy.tools().iter().map(|p| p.as_str()).collect();
        let _ = writeln!(
            out,
            "  {}. {}  {}",
            index.saturating_add(1),
            Theme::header(policy.approver().name()),
            patterns.join(", ")
        );
        let params = policy.approver().params();
        if !params.is_empty() {
            let _ = writeln!(
                out,
                "     {}",
                Theme::dimmed(&serde_json::Value::Object(params).to_string())
            );
        }
    }
    out
}

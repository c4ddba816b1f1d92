//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tollgate_approval::{ApproverRegistry, CommandAllowlistApprover, OperatorChannel, PolicyChain};
use tollgate_config::{ApprovalPolicyConfig, DocumentFormat};

/// Upper bound for anything that should finish promptly.
pub const PROMPT: Duration = Duration::from_secs(5);

/// Built-ins plus the allowlist registered under an extension name.
pub fn registry(operator: Option<Arc<dyn OperatorChannel>>) -> ApproverRegistry {
    let mut registry = ApproverRegistry::with_builtins(operator);
    registry.register("evaltools/bash_allowlist", |name, params| {
        Ok(Arc::new(CommandAllowlistApprover::from_params(name, params)?))
    });
    registry
}

/// Build a shared chain from a YAML policy document.
pub fn chain_from_yaml(yaml: &str, registry: &ApproverRegistry) -> Arc<PolicyChain> {
    let config = ApprovalPolicyConfig::parse(yaml, DocumentFormat::Yaml).unwrap();
    Arc::new(PolicyChain::from_config(&config, registry).unwrap())
}

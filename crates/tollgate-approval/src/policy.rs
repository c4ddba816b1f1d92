//! Approval policies and policy chains.

use std::fmt;
use std::sync::Arc;
use tollgate_config::{ApprovalPolicyConfig, ApproverPolicyConfig, ToolPatterns};
use tracing::info;

use crate::approver::Approver;
use crate::error::{ApprovalError, ApprovalResult};
use crate::pattern::ToolPattern;
use crate::registry::ApproverRegistry;

/// Binds one approver to the tool patterns it is responsible for.
#[derive(Clone)]
pub struct ApprovalPolicy {
    approver: Arc<dyn Approver>,
    tools: Vec<ToolPattern>,
}

impl ApprovalPolicy {
    /// Create a policy.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidPattern`] for an empty pattern, or
    /// [`ApprovalError::InvalidParameters`] if `tools` is empty.
    pub fn new<I, S>(approver: Arc<dyn Approver>, tools: I) -> ApprovalResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tools = tools
            .into_iter()
            .map(ToolPattern::parse)
            .collect::<ApprovalResult<Vec<_>>>()?;
        if tools.is_empty() {
            return Err(ApprovalError::InvalidParameters {
                approver: approver.name().to_owned(),
                message: "policy must name at least one tool pattern".to_owned(),
            });
        }
        Ok(Self { approver, tools })
    }

    /// Policy covering every call.
    #[must_use]
    pub fn any(approver: Arc<dyn Approver>) -> Self {
        Self {
            approver,
            tools: vec![ToolPattern::any()],
        }
    }

    /// Whether any pattern matches `signature`.
    #[must_use]
    pub fn matches(&self, signature: &str) -> bool {
        self.tools.iter().any(|p| p.matches(signature))
    }

    /// The bound approver.
    #[must_use]
    pub fn approver(&self) -> &Arc<dyn Approver> {
        &self.approver
    }

    /// Declared patterns, in order.
    #[must_use]
    pub fn tools(&self) -> &[ToolPattern] {
        &self.tools
    }

    /// Declarative form of this policy.
    #[must_use]
    pub fn to_config(&self) -> ApproverPolicyConfig {
        let tools = match self.tools.as_slice() {
            [single] => ToolPatterns::One(single.to_string()),
            many => ToolPatterns::Many(many.iter().map(ToString::to_string).collect()),
        };
        ApproverPolicyConfig {
            name: self.approver.name().to_owned(),
            tools,
            params: self.approver.params(),
        }
    }
}

impl fmt::Debug for ApprovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApprovalPolicy")
            .field("approver", &self.approver.name())
            .field("tools", &self.tools)
            .finish()
    }
}

/// Ordered, immutable sequence of policies.
///
/// Order defines both matching precedence and escalation order. Chains are
/// shared behind an [`Arc`] and read concurrently by every resolution.
#[derive(Debug, Clone, Default)]
pub struct PolicyChain {
    policies: Vec<ApprovalPolicy>,
}

impl PolicyChain {
    /// Create a chain from policies in escalation order.
    #[must_use]
    pub fn new(policies: Vec<ApprovalPolicy>) -> Self {
        Self { policies }
    }

    /// Build a chain from a validated policy document.
    ///
    /// Every approver is instantiated up front, so unknown names and bad
    /// parameters surface here rather than on first use.
    ///
    /// # Errors
    ///
    /// Returns a configuration error (see
    /// [`ApprovalError::is_configuration`]) for the first entry that fails.
    pub fn from_config(
        config: &ApprovalPolicyConfig,
        registry: &ApproverRegistry,
    ) -> ApprovalResult<Self> {
        tollgate_config::validate::validate(config)?;

        let policies = config
            .approvers
            .iter()
            .map(|entry| {
                let approver = registry.build(&entry.name, &entry.params)?;
                ApprovalPolicy::new(approver, entry.tools.iter().cloned())
            })
            .collect::<ApprovalResult<Vec<_>>>()?;

        info!(
            policies = policies.len(),
            approvers = ?policies.iter().map(|p| p.approver.name()).collect::<Vec<_>>(),
            "Built approval policy chain"
        );
        Ok(Self { policies })
    }

    /// Policies in order.
    #[must_use]
    pub fn policies(&self) -> &[ApprovalPolicy] {
        &self.policies
    }

    /// Policies matching `signature`, in chain order.
    pub fn candidates<'a>(
        &'a self,
        signature: &'a str,
    ) -> impl Iterator<Item = &'a ApprovalPolicy> + 'a {
        self.policies.iter().filter(move |p| p.matches(signature))
    }

    /// Number of policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the chain has no policies. An empty chain rejects every call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Declarative form of the whole chain, for recording a run's setup.
    #[must_use]
    pub fn to_config(&self) -> ApprovalPolicyConfig {
        ApprovalPolicyConfig::new(self.policies.iter().map(ApprovalPolicy::to_config).collect())
    }
}

impl FromIterator<ApprovalPolicy> for PolicyChain {
    fn from_iter<T: IntoIterator<Item = ApprovalPolicy>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approver::AutoApprover;
    use crate::operator::OperatorQueue;
    use tollgate_config::DocumentFormat;
    use tollgate_core::ApprovalDecision;

    const POLICY: &str = r#"
approvers:
  - name: human
    tools: ["web_browser_click", "web_browser_type*"]
  - name: auto
    tools: "*"
    decision: reject
"#;

    fn registry() -> ApproverRegistry {
        let (queue, _inbox) = OperatorQueue::new();
        ApproverRegistry::with_builtins(Some(Arc::new(queue)))
    }

    #[test]
    fn test_policy_matches_any_pattern() {
        let policy = ApprovalPolicy::new(
            Arc::new(AutoApprover::approve()),
            ["web_browser_click", "web_browser_type*"],
        )
        .unwrap();
        assert!(policy.matches("web_browser_click(element_id=3)"));
        assert!(policy.matches("web_browser_type_submit(text='x')"));
        assert!(!policy.matches("web_browser_go(url='x')"));
    }

    #[test]
    fn test_policy_requires_patterns() {
        let empty: [&str; 0] = [];
        assert!(ApprovalPolicy::new(Arc::new(AutoApprover::approve()), empty).is_err());
        assert!(ApprovalPolicy::new(Arc::new(AutoApprover::approve()), [""]).is_err());
    }

    #[test]
    fn test_from_config_preserves_order() {
        let config = ApprovalPolicyConfig::parse(POLICY, DocumentFormat::Yaml).unwrap();
        let chain = PolicyChain::from_config(&config, &registry()).unwrap();
        let names: Vec<_> = chain.policies().iter().map(|p| p.approver().name()).collect();
        assert_eq!(names, vec!["human", "auto"]);

        let candidates: Vec<_> = chain
            .candidates("web_browser_type(text='hi')")
            .map(|p| p.approver().name())
            .collect();
        assert_eq!(candidates, vec!["human", "auto"]);
        assert_eq!(chain.candidates("bash(cmd='ls')").count(), 1);
    }

    #[test]
    fn test_from_config_unknown_approver() {
        let config = ApprovalPolicyConfig::new(vec![ApproverPolicyConfig::new("model", "*")]);
        let err = PolicyChain::from_config(&config, &registry()).unwrap_err();
        assert!(matches!(err, ApprovalError::UnknownApprover { .. }));
    }

    #[test]
    fn test_from_config_validates() {
        let config = ApprovalPolicyConfig::new(vec![]);
        let err = PolicyChain::from_config(&config, &registry()).unwrap_err();
        assert!(matches!(err, ApprovalError::Config(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_to_config_round_trip() {
        let config = ApprovalPolicyConfig::parse(POLICY, DocumentFormat::Yaml).unwrap();
        let chain = PolicyChain::from_config(&config, &registry()).unwrap();
        let recorded = chain.to_config();
        assert_eq!(recorded, config);

        let rebuilt = PolicyChain::from_config(&recorded, &registry()).unwrap();
        assert_eq!(rebuilt.len(), 2);
    }

    #[test]
    fn test_chain_from_iter() {
        let chain: PolicyChain = [
            ApprovalPolicy::any(Arc::new(AutoApprover::approve())),
            ApprovalPolicy::any(Arc::new(
                AutoApprover::with_decision(ApprovalDecision::Reject).unwrap(),
            )),
        ]
        .into_iter()
        .collect();
        assert_eq!(chain.len(), 2);
        assert!(!chain.is_empty());
        assert!(PolicyChain::default().is_empty());
    }
}

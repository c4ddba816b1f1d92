use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Construction parameters forwarded to an approver.
///
/// Every key of a policy entry other than `name` and `tools` lands here.
pub type ApproverParams = Map<String, Value>;

/// Keys that belong to the entry itself and are never forwarded as parameters.
pub const RESERVED_KEYS: [&str; 2] = ["name", "tools"];

/// A whole policy document: approver entries in escalation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalPolicyConfig {
    /// Approver entries, first to last.
    pub approvers: Vec<ApproverPolicyConfig>,
}

impl ApprovalPolicyConfig {
    /// Create a document from entries.
    #[must_use]
    pub fn new(approvers: Vec<ApproverPolicyConfig>) -> Self {
        Self { approvers }
    }

    /// The document that `--approval human` stands for: one human approver
    /// responsible for every tool.
    #[must_use]
    pub fn human() -> Self {
        Self::new(vec![ApproverPolicyConfig::new("human", "*")])
    }

    /// Append an entry and return `self` (builder pattern).
    #[must_use]
    pub fn with_approver(mut self, approver: ApproverPolicyConfig) -> Self {
        self.approvers.push(approver);
        self
    }
}

/// One approver entry of a policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproverPolicyConfig {
    /// Registered approver name, possibly namespaced (`extension/name`).
    pub name: String,
    /// Patterns matched against tool call signatures.
    pub tools: ToolPatterns,
    /// Remaining keys, passed to the approver constructor.
    #[serde(flatten)]
    pub params: ApproverParams,
}

impl ApproverPolicyConfig {
    /// Create an entry without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, tools: impl Into<ToolPatterns>) -> Self {
        Self {
            name: name.into(),
            tools: tools.into(),
            params: ApproverParams::new(),
        }
    }

    /// Attach a construction parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// `tools` accepts either a single pattern or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolPatterns {
    /// A single pattern.
    One(String),
    /// Several patterns; any of them may match.
    Many(Vec<String>),
}

impl ToolPatterns {
    /// The patterns as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(pattern) => std::slice::from_ref(pattern),
            Self::Many(patterns) => patterns,
        }
    }

    /// Iterate over the patterns.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.as_slice().iter()
    }
}

impl From<&str> for ToolPatterns {
    fn from(pattern: &str) -> Self {
        Self::One(pattern.to_owned())
    }
}

impl From<String> for ToolPatterns {
    fn from(pattern: String) -> Self {
        Self::One(pattern)
    }
}

impl From<Vec<String>> for ToolPatterns {
    fn from(patterns: Vec<String>) -> Self {
        Self::Many(patterns)
    }
}

impl<const N: usize> From<[&str; N]> for ToolPatterns {
    fn from(patterns: [&str; N]) -> Self {
        Self::Many(patterns.iter().map(|p| (*p).to_owned()).collect())
    }
}

impl<'a> IntoIterator for &'a ToolPatterns {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

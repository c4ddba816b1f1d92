//! Tool pattern matching.
//!
//! Patterns are literal prefixes of a call's [signature](tollgate_core::ToolCall::signature).
//! `*` on its own matches everything. A trailing `*` is accepted for
//! readability and stripped, since every pattern is already open on the
//! right. No other character is special.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ApprovalError, ApprovalResult};

/// Pure prefix test used by every policy.
///
/// ```
/// use tollgate_approval::pattern::matches;
///
/// assert!(matches("web_browser_type", "web_browser_type_submit"));
/// assert!(!matches("web_browser_type", "web_browser_click"));
/// assert!(matches("*", "anything(at='all')"));
/// ```
#[must_use]
pub fn matches(pattern: &str, signature: &str) -> bool {
    pattern == "*" || signature.starts_with(pattern)
}

/// A parsed tool pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolPattern {
    raw: String,
    prefix: Option<String>,
}

impl ToolPattern {
    /// Parse a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidPattern`] for an empty pattern.
    pub fn parse(raw: impl Into<String>) -> ApprovalResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ApprovalError::InvalidPattern {
                pattern: raw,
                message: "pattern must not be empty".to_owned(),
            });
        }
        let prefix = if raw == "*" {
            None
        } else {
            Some(raw.strip_suffix('*').unwrap_or(&raw).to_owned())
        };
        Ok(Self { raw, prefix })
    }

    /// The pattern matching every call.
    #[must_use]
    pub fn any() -> Self {
        Self {
            raw: "*".to_owned(),
            prefix: None,
        }
    }

    /// Whether this pattern matches `signature`.
    #[must_use]
    pub fn matches(&self, signature: &str) -> bool {
        match &self.prefix {
            None => true,
            Some(prefix) => matches(prefix, signature),
        }
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ToolPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for ToolPattern {
    type Error = ApprovalError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<ToolPattern> for String {
    fn from(pattern: ToolPattern) -> Self {
        pattern.raw
    }
}

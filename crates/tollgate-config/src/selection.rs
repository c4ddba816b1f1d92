use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};
use crate::loader;
use crate::types::ApprovalPolicyConfig;
use crate::validate;

/// Run-level approval setting.
///
/// Accepts the literal `human`, a path to a policy document, or a document
/// built in code. Leaving it unset (no `ApprovalSelection` at all) disables
/// run-level approval.
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalSelection {
    /// A human approver for every tool call.
    Human,
    /// A policy document on disk.
    File(PathBuf),
    /// A policy document built in code.
    Policies(ApprovalPolicyConfig),
}

impl ApprovalSelection {
    /// Produce the validated policy document this selection stands for.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the document cannot be loaded or is
    /// invalid.
    pub fn resolve(&self) -> ConfigResult<ApprovalPolicyConfig> {
        match self {
            Self::Human => Ok(ApprovalPolicyConfig::human()),
            Self::File(path) => loader::load_file(path),
            Self::Policies(config) => {
                validate::validate(config)?;
                Ok(config.clone())
            },
        }
    }
}

impl FromStr for ApprovalSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(ConfigError::ValidationError {
                field: "approval".to_owned(),
                message: "expected 'human' or a path to a policy document".to_owned(),
            }),
            "human" => Ok(Self::Human),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

impl From<ApprovalPolicyConfig> for ApprovalSelection {
    fn from(config: ApprovalPolicyConfig) -> Self {
        Self::Policies(config)
    }
}

impl fmt::Display for ApprovalSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Policies(config) => write!(f, "<{} inline approvers>", config.approvers.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApproverPolicyConfig;

    #[test]
    fn test_parse_human() {
        assert_eq!("human".parse::<ApprovalSelection>().unwrap(), ApprovalSelection::Human);
        assert_eq!(" human ".parse::<ApprovalSelection>().unwrap(), ApprovalSelection::Human);
    }

    #[test]
    fn test_parse_path() {
        let selection: ApprovalSelection = "policies/approval.yaml".parse().unwrap();
        assert_eq!(
            selection,
            ApprovalSelection::File(PathBuf::from("policies/approval.yaml"))
        );
    }

    #[test]
    fn test_parse_empty_rejected() {
        assert!("  ".parse::<ApprovalSelection>().is_err());
    }

    #[test]
    fn test_resolve_human() {
        let config = ApprovalSelection::Human.resolve().unwrap();
        assert_eq!(config, ApprovalPolicyConfig::human());
    }

    #[test]
    fn test_resolve_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("approval.yaml");
        std::fs::write(&path, "approvers:\n  - name: auto\n    tools: '*'\n").unwrap();
        let config = ApprovalSelection::File(path).resolve().unwrap();
        assert_eq!(config.approvers[0].name, "auto");
    }

    #[test]
    fn test_resolve_inline_is_validated() {
        let invalid = ApprovalSelection::from(ApprovalPolicyConfig::default());
        assert!(invalid.resolve().is_err());

        let valid = ApprovalSelection::from(ApprovalPolicyConfig::new(vec![
            ApproverPolicyConfig::new("auto", "*"),
        ]));
        assert_eq!(valid.resolve().unwrap().approvers.len(), 1);
    }
}

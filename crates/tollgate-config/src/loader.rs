//! Policy document loading.
//!
//! Implements [`load_file`]:
//! 1. Pick the format from the file extension
//! 2. Read the file in one operation and enforce the size limit
//! 3. Deserialize into [`ApprovalPolicyConfig`]
//! 4. Validate

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::ApprovalPolicyConfig;
use crate::validate;

/// Maximum allowed policy document size (1 MB).
pub const MAX_POLICY_FILE_SIZE: u64 = 1_048_576;

/// Serialization format of a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML (`.yaml`, `.yml`).
    Yaml,
    /// TOML (`.toml`).
    Toml,
    /// JSON (`.json`).
    Json,
}

impl DocumentFormat {
    /// Infer the format from a path's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Toml => write!(f, "toml"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Load a policy document from a specific file path.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the format is unknown, the file cannot be
/// read, exceeds [`MAX_POLICY_FILE_SIZE`], fails to parse or to validate.
pub fn load_file(path: &Path) -> ConfigResult<ApprovalPolicyConfig> {
    let format = DocumentFormat::from_path(path)?;

    // Single read, then size check, to avoid a stat/read race.
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.len() as u64 > MAX_POLICY_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "policy document is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_POLICY_FILE_SIZE
            ),
        });
    }

    let config = parse_str(&content, format, &path.display().to_string())?;
    info!(
        path = %path.display(),
        %format,
        approvers = config.approvers.len(),
        "loaded approval policy document"
    );
    Ok(config)
}

/// Parse and validate a policy document. `origin` names the source in errors.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] on malformed input and
/// [`ConfigError::ValidationError`] when the document is well-formed but
/// invalid.
pub fn parse_str(
    text: &str,
    format: DocumentFormat,
    origin: &str,
) -> ConfigResult<ApprovalPolicyConfig> {
    let parse_err = |message: String| ConfigError::ParseError {
        path: origin.to_owned(),
        message,
    };

    let config: ApprovalPolicyConfig = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?,
        DocumentFormat::Toml => toml::from_str(text).map_err(|e| parse_err(e.to_string()))?,
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string()))?,
    };

    debug!(origin, %format, "parsed approval policy document");
    validate::validate(&config)?;
    Ok(config)
}

/// Serialize a policy document, e.g. to record the policy a run used.
///
/// # Errors
///
/// Returns [`ConfigError::SerializeError`] if a parameter cannot be
/// represented in `format` (TOML has no `null`, for instance).
pub fn render(config: &ApprovalPolicyConfig, format: DocumentFormat) -> ConfigResult<String> {
    let ser_err = |e: &dyn fmt::Display| ConfigError::SerializeError(e.to_string());
    match format {
        DocumentFormat::Yaml => serde_yaml::to_string(config).map_err(|e| ser_err(&e)),
        DocumentFormat::Toml => toml::to_string(config).map_err(|e| ser_err(&e)),
        DocumentFormat::Json => serde_json::to_string_pretty(config).map_err(|e| ser_err(&e)),
    }
}

impl ApprovalPolicyConfig {
    /// Serialize this document in `format`.
    ///
    /// # Errors
    ///
    /// See [`render`].
    pub fn render(&self, format: DocumentFormat) -> ConfigResult<String> {
        render(self, format)
    }
}

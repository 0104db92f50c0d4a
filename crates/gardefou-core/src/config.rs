//! Profile settings and their sources.
//!
//! Settings come in layers: a base layer (a mapping or a JSON/YAML file) and
//! an override layer of explicit values. Layers merge key by key; a key in the
//! override layer replaces the base value only when it is present. Presence is
//! significant: it decides which rules a [`Profile`](crate::Profile) enables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};
use crate::handler::ViolationHandler;

/// Settings mapping for a [`Profile`](crate::Profile).
///
/// Every field is optional. Unknown keys in settings files are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Maximum number of calls. Negative values leave the quota rule off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_calls: Option<i64>,

    /// Default policy for every rule without its own handler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_violation: Option<ViolationHandler>,

    /// Policy for the quota rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_violation_max_calls: Option<ViolationHandler>,

    /// Policy for the duplicate rule. Its presence enables the rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_violation_duplicate_call: Option<ViolationHandler>,
}

impl ProfileConfig {
    /// Empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the call limit.
    #[must_use]
    pub const fn with_max_calls(mut self, max_calls: i64) -> Self {
        self.max_calls = Some(max_calls);
        self
    }

    /// Sets the default policy.
    #[must_use]
    pub fn with_on_violation(mut self, handler: ViolationHandler) -> Self {
        self.on_violation = Some(handler);
        self
    }

    /// Sets the quota rule policy.
    #[must_use]
    pub fn with_on_violation_max_calls(mut self, handler: ViolationHandler) -> Self {
        self.on_violation_max_calls = Some(handler);
        self
    }

    /// Sets the duplicate rule policy, enabling the rule.
    #[must_use]
    pub fn with_on_violation_duplicate_call(mut self, handler: ViolationHandler) -> Self {
        self.on_violation_duplicate_call = Some(handler);
        self
    }

    /// Layers `overrides` on top of `self`, key by key.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            max_calls: overrides.max_calls.or(self.max_calls),
            on_violation: overrides.on_violation.or(self.on_violation),
            on_violation_max_calls: overrides
                .on_violation_max_calls
                .or(self.on_violation_max_calls),
            on_violation_duplicate_call: overrides
                .on_violation_duplicate_call
                .or(self.on_violation_duplicate_call),
        }
    }

    /// Builds settings from a dynamic mapping.
    ///
    /// # Errors
    /// Returns [`GuardError::Config`] if the value is not a mapping or holds
    /// an invalid setting.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| GuardError::config(format!("invalid settings: {e}"))),
            serde_json::Value::Null => Ok(Self::default()),
            other => Err(GuardError::config(format!(
                "settings must be a mapping, got {other}"
            ))),
        }
    }

    /// Loads settings from a JSON or YAML file.
    ///
    /// Files ending in `.yaml` or `.yml` parse as YAML; anything else as JSON.
    ///
    /// # Errors
    /// Returns [`GuardError::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GuardError::config(format!("failed to read {}: {e}", path.display()))
        })?;

        let format = SettingsFormat::from_path(path);
        let config = format.parse(&content).map_err(|e| {
            GuardError::config(format!("failed to parse {}: {e}", path.display()))
        })?;

        tracing::debug!(path = %path.display(), format = ?format, "loaded profile settings");
        Ok(config)
    }
}

/// Encoding of a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

impl SettingsFormat {
    /// Picks the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    fn parse(self, content: &str) -> std::result::Result<ProfileConfig, String> {
        match self {
            Self::Json => {
                let value: serde_json::Value =
                    serde_json::from_str(content).map_err(|e| e.to_string())?;
                ProfileConfig::from_value(value).map_err(|e| e.to_string())
            }
            Self::Yaml => {
                if content.trim().is_empty() {
                    return Ok(ProfileConfig::default());
                }
                let value: serde_yaml::Value =
                    serde_yaml::from_str(content).map_err(|e| e.to_string())?;
                match value {
                    serde_yaml::Value::Null => Ok(ProfileConfig::default()),
                    serde_yaml::Value::Mapping(_) => {
                        serde_yaml::from_value(value).map_err(|e| e.to_string())
                    }
                    _ => Err("settings must be a mapping".to_string()),
                }
            }
        }
    }
}

/// Base layer of a profile's settings.
#[derive(Debug, Clone, Default)]
pub enum ConfigSource {
    /// No base settings.
    #[default]
    None,
    /// In-memory settings mapping.
    Settings(ProfileConfig),
    /// Path to a JSON or YAML settings file.
    File(PathBuf),
}

impl ConfigSource {
    /// Resolves the source into settings, reading the file if there is one.
    ///
    /// # Errors
    /// Returns [`GuardError::Config`] if a file source cannot be loaded.
    pub fn resolve(self) -> Result<ProfileConfig> {
        match self {
            Self::None => Ok(ProfileConfig::default()),
            Self::Settings(config) => Ok(config),
            Self::File(path) => ProfileConfig::load(path),
        }
    }
}

impl From<ProfileConfig> for ConfigSource {
    fn from(config: ProfileConfig) -> Self {
        Self::Settings(config)
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

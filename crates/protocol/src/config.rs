//! Versioned config file schema.
//!
//! One explicit JSON shape with a version marker. Unrecognized versions are
//! rejected loudly instead of silently falling back to a legacy shape.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::AppExecutableSpec;

/// The only config schema version this build understands.
pub const CONFIG_VERSION: u32 = 1;

/// Errors produced while loading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config version {0}, expected {CONFIG_VERSION}")]
    UnsupportedVersion(u32),

    #[error("stagingRoot must not be empty")]
    MissingStagingRoot,
}

/// A target host with an optional per-host app-root override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEntry {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_root: Option<String>,
}

/// Root config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub version: u32,
    pub staging_root: String,
    #[serde(default)]
    pub apps: Vec<AppExecutableSpec>,
    #[serde(default)]
    pub environments: Vec<String>,
    #[serde(default)]
    pub hosts: Vec<HostEntry>,
}

impl ConfigFile {
    /// Parses and validates a config document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut config: ConfigFile = serde_json::from_str(text)?;
        if config.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(config.version));
        }
        if config.staging_root.trim().is_empty() {
            return Err(ConfigError::MissingStagingRoot);
        }
        config.normalize();
        Ok(config)
    }

    /// Loads a config file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Drops blank entries and case-insensitive duplicates.
    fn normalize(&mut self) {
        self.environments.retain(|e| !e.trim().is_empty());
        dedup_ci(&mut self.environments, |e| e.clone());

        self.hosts.retain(|h| !h.host.trim().is_empty());
        dedup_ci(&mut self.hosts, |h| h.host.clone());

        let before = self.apps.len();
        self.apps
            .retain(|a| !a.name.trim().is_empty() && !a.executable.trim().is_empty());
        if self.apps.len() != before {
            warn!(
                dropped = before - self.apps.len(),
                "config contained app specs without name or executable"
            );
        }
    }
}

fn dedup_ci<T>(items: &mut Vec<T>, key: impl Fn(&T) -> String) {
    let mut seen: Vec<String> = Vec::new();
    items.retain(|item| {
        let k = key(item).to_ascii_lowercase();
        if seen.contains(&k) {
            false
        } else {
            seen.push(k);
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(version: u32) -> String {
        format!(
            r#"{{
                "version": {version},
                "stagingRoot": "/srv/staging",
                "apps": [
                    {{"name": "Trader", "executable": "Trader.exe", "productGroup": "Trading"}},
                    {{"name": "", "executable": "x.exe", "productGroup": "Trading"}}
                ],
                "environments": ["Dev", "QA", "dev", "  "],
                "hosts": [
                    {{"host": "WS01"}},
                    {{"host": "ws01"}},
                    {{"host": "WS02", "appRoot": "Apps"}}
                ]
            }}"#
        )
    }

    #[test]
    fn load_valid_config() {
        let config = ConfigFile::from_json(&sample_json(1)).unwrap();
        assert_eq!(config.staging_root, "/srv/staging");
        // Nameless app spec dropped.
        assert_eq!(config.apps.len(), 1);
        // Blank env and case-insensitive duplicate dropped.
        assert_eq!(config.environments, vec!["Dev", "QA"]);
        // Duplicate host dropped, override preserved.
        assert_eq!(config.hosts.len(), 2);
        assert_eq!(config.hosts[1].app_root.as_deref(), Some("Apps"));
    }

    #[test]
    fn reject_unknown_version() {
        let err = ConfigFile::from_json(&sample_json(2)).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion(2)));
    }

    #[test]
    fn reject_missing_staging_root() {
        let json = r#"{"version": 1, "stagingRoot": "  "}"#;
        let err = ConfigFile::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::MissingStagingRoot));
    }

    #[test]
    fn reject_legacy_shape() {
        // The historical config was a bare name->exe map; it must fail
        // loudly, not be silently coerced.
        let legacy = r#"{"Trader": "Trader.exe"}"#;
        assert!(matches!(
            ConfigFile::from_json(legacy),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn defaults_for_optional_sections() {
        let json = r#"{"version": 1, "stagingRoot": "/srv/staging"}"#;
        let config = ConfigFile::from_json(json).unwrap();
        assert!(config.apps.is_empty());
        assert!(config.environments.is_empty());
        assert!(config.hosts.is_empty());
    }
}

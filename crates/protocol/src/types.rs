use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-application executable spec, owned by configuration.
///
/// Describes how one application's builds are laid out under the staging
/// root and how its launch shortcut is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppExecutableSpec {
    /// Application name, unique within the config (case-insensitive).
    pub name: String,
    /// Executable file name, e.g. `Trader.exe` or `Trader.msix`.
    pub executable: String,
    /// Relative subfolder between the build directory and the executable.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_folder: String,
    /// Product grouping: the staging subtree shared by one or more apps.
    pub product_group: String,
    /// Packaged-artifact layout: builds live as single files under
    /// per-environment directories.
    #[serde(default)]
    pub requires_environment: bool,
    /// The environment is baked into the shortcut's launch arguments
    /// rather than into a destination path segment.
    #[serde(default)]
    pub env_in_shortcut: bool,
}

impl AppExecutableSpec {
    /// Extension of the executable file, without the leading dot.
    pub fn executable_extension(&self) -> Option<&str> {
        let (_, ext) = self.executable.rsplit_once('.')?;
        if ext.is_empty() { None } else { Some(ext) }
    }
}

/// Immutable set of [`AppExecutableSpec`]s with case-insensitive lookup.
#[derive(Debug, Clone, Default)]
pub struct SpecSet {
    specs: Vec<AppExecutableSpec>,
}

impl SpecSet {
    pub fn new(specs: Vec<AppExecutableSpec>) -> Self {
        Self { specs }
    }

    /// Looks up a spec by application name, case-insensitively.
    pub fn get(&self, app: &str) -> Option<&AppExecutableSpec> {
        self.specs
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(app))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppExecutableSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// One deployable unit discovered in the staging repository.
///
/// `environment == None` means the build is environment-neutral (a single
/// shared executable). A variant is only produced when the corresponding
/// executable file was actually observed on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildVariant {
    pub build: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Discovered build variants for one application, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppBuildGroup {
    pub app: String,
    pub variants: Vec<BuildVariant>,
}

/// A caller-chosen (app, build, environment) triple to deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSelection {
    pub app: String,
    pub build: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Parses selections in the wire form `App|Build` or `App|Build|Environment`.
///
/// Malformed or blank entries are dropped rather than rejected; the
/// orchestrator validates the survivors against the staging layout.
pub fn parse_selections<S: AsRef<str>>(raw: &[S]) -> Vec<DeploymentSelection> {
    let mut out = Vec::new();
    for entry in raw {
        let parts: Vec<&str> = entry.as_ref().split('|').map(str::trim).collect();
        match parts.as_slice() {
            [app, build] if !app.is_empty() && !build.is_empty() => {
                out.push(DeploymentSelection {
                    app: (*app).to_string(),
                    build: (*build).to_string(),
                    environment: None,
                });
            }
            [app, build, env] if !app.is_empty() && !build.is_empty() && !env.is_empty() => {
                out.push(DeploymentSelection {
                    app: (*app).to_string(),
                    build: (*build).to_string(),
                    environment: Some((*env).to_string()),
                });
            }
            _ => {}
        }
    }
    out
}

/// Most recent probe result for one target host.
///
/// `accessible` reflects only network reachability; `root_exists` is a
/// secondary fact that never downgrades it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatus {
    pub host: String,
    pub accessible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    pub checked_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HostStatus {
    /// A fresh status for a host that has not been probed yet.
    pub fn unchecked(host: &str) -> Self {
        Self {
            host: host.to_string(),
            accessible: false,
            root_exists: None,
            latency_ms: None,
            checked_utc: Utc::now(),
            message: None,
        }
    }
}

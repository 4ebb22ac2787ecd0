//! Path construction for the staging repository and the target hosts.

use std::path::{Path, PathBuf};

use fleetdeploy_protocol::AppExecutableSpec;

/// Read-side layout: where builds live under the staging root.
///
/// Two shapes exist:
/// - build directories: `root/productGroup/build[/subFolder][/environment]/executable`
/// - packaged artifacts: `root/productGroup/environment/build.<ext>`
#[derive(Debug, Clone)]
pub struct StagingLayout {
    root: PathBuf,
}

impl StagingLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staging subtree for a spec's product group.
    pub fn product_dir(&self, spec: &AppExecutableSpec) -> PathBuf {
        self.root.join(&spec.product_group)
    }

    /// Build directory including the spec's optional subfolder.
    pub fn build_dir(&self, spec: &AppExecutableSpec, build: &str) -> PathBuf {
        let dir = self.product_dir(spec).join(build);
        if spec.sub_folder.is_empty() {
            dir
        } else {
            dir.join(&spec.sub_folder)
        }
    }

    /// Resolves the source path for one (spec, build, environment) triple.
    ///
    /// Packaged layouts resolve to the artifact file and need an environment;
    /// without one this returns `None`. For build-directory layouts an
    /// environment resolves to the env subdirectory when it exists on disk
    /// and otherwise falls back to the environment-neutral build directory
    /// (the case where an env-less selection was expanded against the
    /// caller's environment list).
    pub fn source_path(
        &self,
        spec: &AppExecutableSpec,
        build: &str,
        environment: Option<&str>,
    ) -> Option<PathBuf> {
        if spec.requires_environment {
            let env = environment?;
            let ext = spec.executable_extension()?;
            return Some(self.product_dir(spec).join(env).join(format!("{build}.{ext}")));
        }

        let candidate = self.build_dir(spec, build);
        match environment {
            Some(env) => {
                let env_dir = candidate.join(env);
                if env_dir.is_dir() {
                    Some(env_dir)
                } else {
                    Some(candidate)
                }
            }
            None => Some(candidate),
        }
    }

    /// Whether the resolved source for a triple exists on disk.
    pub fn source_exists(
        &self,
        spec: &AppExecutableSpec,
        build: &str,
        environment: Option<&str>,
    ) -> bool {
        match self.source_path(spec, build, environment) {
            Some(path) if spec.requires_environment => path.is_file(),
            Some(path) => path.is_dir(),
            None => false,
        }
    }
}

/// Write-side layout: where deployed builds and shortcuts live on a target.
///
/// A capability interface so tests (and non-Windows hosts) can point the
/// orchestrator at plain directories instead of UNC shares.
pub trait TargetLayout: Send + Sync {
    /// Root of the deployed-apps tree as reachable from this process.
    fn dest_root(&self, host: &str) -> PathBuf;

    /// Root of the deployed-apps tree as seen on the target host itself.
    /// Shortcut target paths are built from this.
    fn local_root(&self) -> PathBuf;

    /// Directory that receives published shortcuts.
    fn shortcut_dir(&self, host: &str) -> PathBuf {
        self.dest_root(host)
    }
}

/// Standard layout over a host's administrative share.
///
/// `share_pattern` contains a `{host}` placeholder, e.g. `\\{host}\C$`.
#[derive(Debug, Clone)]
pub struct UncTargetLayout {
    pub share_pattern: String,
    pub app_root: String,
    pub local_prefix: String,
}

impl UncTargetLayout {
    pub fn new(app_root: impl Into<String>) -> Self {
        Self {
            share_pattern: r"\\{host}\C$".to_string(),
            app_root: app_root.into(),
            local_prefix: r"C:\".to_string(),
        }
    }
}

impl TargetLayout for UncTargetLayout {
    fn dest_root(&self, host: &str) -> PathBuf {
        PathBuf::from(self.share_pattern.replace("{host}", host)).join(&self.app_root)
    }

    fn local_root(&self) -> PathBuf {
        PathBuf::from(&self.local_prefix).join(&self.app_root)
    }
}

/// Destination directory for one job: `dest_root/productGroup/app/build`,
/// with the environment appended only when it travels as a path segment.
pub fn dest_dir(
    dest_root: &Path,
    spec: &AppExecutableSpec,
    build: &str,
    environment: Option<&str>,
) -> PathBuf {
    let mut dir = dest_root
        .join(&spec.product_group)
        .join(&spec.name)
        .join(build);
    if let Some(env) = environment
        && !spec.env_in_shortcut
    {
        dir.push(env);
    }
    dir
}

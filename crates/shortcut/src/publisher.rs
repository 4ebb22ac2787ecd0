//! Publishes launch shortcuts to a target host's shared folder.

use std::path::PathBuf;
use std::sync::Arc;

use fleetdeploy_protocol::AppExecutableSpec;
use tracing::{info, warn};
use uuid::Uuid;

use crate::writer::{ShortcutSpec, ShortcutWriter};
use crate::ShortcutError;

/// Where shortcuts land and how target paths are phrased.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Shared shortcut folder with a `{host}` placeholder,
    /// e.g. `\\{host}\C$\Apps`.
    pub shortcut_dir_pattern: String,
    /// Deployed-apps root as seen on the target host itself; shortcut
    /// target paths are built under it.
    pub local_root: PathBuf,
    /// Private scratch directory for building artifacts before the copy.
    pub temp_dir: PathBuf,
}

impl PublisherConfig {
    pub fn new(shortcut_dir_pattern: impl Into<String>, local_root: impl Into<PathBuf>) -> Self {
        Self {
            shortcut_dir_pattern: shortcut_dir_pattern.into(),
            local_root: local_root.into(),
            temp_dir: std::env::temp_dir().join("fleetdeploy-shortcuts"),
        }
    }
}

/// Builds a shortcut artifact in temp, verifies it, and copies it to the
/// target's shared folder.
pub struct ShortcutPublisher {
    writer: Arc<dyn ShortcutWriter>,
    config: PublisherConfig,
}

/// Deletes the temp artifact on every exit path.
struct TempArtifact(PathBuf);

impl Drop for TempArtifact {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

impl ShortcutPublisher {
    pub fn new(writer: Arc<dyn ShortcutWriter>, config: PublisherConfig) -> Self {
        Self { writer, config }
    }

    /// Publishes one shortcut.
    ///
    /// Returns the remote shortcut path, or `Ok(None)` when the target's
    /// shortcut folder does not exist (a soft failure: logged, not raised).
    pub fn publish(
        &self,
        host: &str,
        spec: &AppExecutableSpec,
        build: &str,
        environment: Option<&str>,
    ) -> Result<Option<PathBuf>, ShortcutError> {
        let shortcut_dir = PathBuf::from(self.config.shortcut_dir_pattern.replace("{host}", host));
        if !shortcut_dir.is_dir() {
            warn!(
                host,
                dir = %shortcut_dir.display(),
                "shortcut folder missing or inaccessible"
            );
            return Ok(None);
        }

        let shortcut = self.build_spec(spec, build, environment);
        let file_name = shortcut_file_name(spec, build, environment, self.writer.extension());
        let remote_path = shortcut_dir.join(&file_name);

        std::fs::create_dir_all(&self.config.temp_dir)?;
        let local_path = self
            .config
            .temp_dir
            .join(format!("{}.{}", Uuid::new_v4().simple(), self.writer.extension()));
        let _guard = TempArtifact(local_path.clone());

        self.writer.write(&local_path, &shortcut)?;
        if !local_path.is_file() {
            return Err(ShortcutError::NotWritten(local_path));
        }

        std::fs::copy(&local_path, &remote_path)?;
        info!(host, path = %remote_path.display(), "shortcut published");
        Ok(Some(remote_path))
    }

    fn build_spec(
        &self,
        spec: &AppExecutableSpec,
        build: &str,
        environment: Option<&str>,
    ) -> ShortcutSpec {
        let mut target_dir = self
            .config
            .local_root
            .join(&spec.product_group)
            .join(&spec.name)
            .join(build);
        if let Some(env) = environment
            && !spec.env_in_shortcut
        {
            target_dir.push(env);
        }
        let target = target_dir.join(&spec.executable);

        let arguments = match environment {
            Some(env) if spec.env_in_shortcut => format!("-Configuration {env} -Mode {env}"),
            _ => String::new(),
        };

        ShortcutSpec {
            name: display_name(spec, build, environment),
            target: target.to_string_lossy().into_owned(),
            working_dir: target_dir.to_string_lossy().into_owned(),
            arguments,
        }
    }
}

fn display_name(spec: &AppExecutableSpec, build: &str, environment: Option<&str>) -> String {
    match environment {
        Some(env) => format!("{} {} {}", spec.name, build, env),
        None => format!("{} {}", spec.name, build),
    }
}

/// Filename encodes app, build and environment so that later pattern-based
/// cleanup can find every shortcut belonging to a deployment.
fn shortcut_file_name(
    spec: &AppExecutableSpec,
    build: &str,
    environment: Option<&str>,
    extension: &str,
) -> String {
    format!("{}.{extension}", display_name(spec, build, environment))
}

//! Enumerates deployed apps and their build directories.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::FileOpsError;

/// One deployed app and the builds present for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentGroup {
    pub app: String,
    pub builds: Vec<String>,
}

/// Lists every deployed app under `root`, alphabetical by app name.
///
/// A missing root is an empty deployment, not an error: the caller may be
/// asking about a host that never received anything.
pub fn list_deployments(root: &Path) -> Result<Vec<DeploymentGroup>, FileOpsError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut groups = Vec::new();
    for group_dir in subdirs(root)? {
        for app_dir in subdirs(&group_dir)? {
            let Some(app) = dir_name(&app_dir) else {
                continue;
            };
            let mut builds: Vec<String> = subdirs(&app_dir)?
                .iter()
                .filter_map(|d| dir_name(d))
                .collect();
            builds.sort();
            groups.push(DeploymentGroup { app, builds });
        }
    }
    groups.sort_by(|a, b| a.app.to_ascii_lowercase().cmp(&b.app.to_ascii_lowercase()));
    Ok(groups)
}

fn dir_name(path: &Path) -> Option<String> {
    Some(path.file_name()?.to_string_lossy().into_owned())
}

pub(crate) fn subdirs(dir: &Path) -> Result<Vec<PathBuf>, FileOpsError> {
    let mut out = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "directory not readable");
            return Ok(out);
        }
    };
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            out.push(entry.path());
        }
    }
    Ok(out)
}

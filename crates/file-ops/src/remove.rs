//! Safe recursive removal of deployed apps and builds.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::list::subdirs;
use crate::{FileOpsError, validate_name};

/// Removes one deployed build of an app. Returns the deleted path.
pub fn remove_build(root: &Path, app: &str, build: &str) -> Result<PathBuf, FileOpsError> {
    validate_name(app)?;
    validate_name(build)?;

    let app_dir = find_app_dir(root, app)?;
    let build_dir = app_dir.join(build);
    if !build_dir.is_dir() {
        return Err(FileOpsError::NotFound(build_dir));
    }
    remove_tree(&build_dir)?;
    info!(app, build, path = %build_dir.display(), "build removed");
    Ok(build_dir)
}

/// Removes a deployed app with all its builds. Returns the deleted path.
pub fn remove_app(root: &Path, app: &str) -> Result<PathBuf, FileOpsError> {
    validate_name(app)?;

    let app_dir = find_app_dir(root, app)?;
    remove_tree(&app_dir)?;
    info!(app, path = %app_dir.display(), "app removed");
    Ok(app_dir)
}

/// Locates `root/<productGroup>/<app>`, matching the app case-insensitively.
fn find_app_dir(root: &Path, app: &str) -> Result<PathBuf, FileOpsError> {
    for group_dir in subdirs(root)? {
        for app_dir in subdirs(&group_dir)? {
            if let Some(name) = app_dir.file_name()
                && name.to_string_lossy().eq_ignore_ascii_case(app)
            {
                return Ok(app_dir);
            }
        }
    }
    Err(FileOpsError::NotFound(root.join(app)))
}

/// Deletes a tree, clearing read-only attributes first.
///
/// Deployed files copied from read-only staging media keep the attribute,
/// which makes a plain recursive delete fail on Windows.
fn remove_tree(dir: &Path) -> Result<(), FileOpsError> {
    clear_readonly(dir)?;
    std::fs::remove_dir_all(dir)?;
    Ok(())
}

fn clear_readonly(dir: &Path) -> Result<(), FileOpsError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            clear_readonly(&entry.path())?;
        } else if metadata.permissions().readonly() {
            let mut perms = metadata.permissions();
            perms.set_readonly(false);
            std::fs::set_permissions(entry.path(), perms)?;
        }
    }
    Ok(())
}

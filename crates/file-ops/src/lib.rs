//! Maintenance operations on a target's deployed-apps tree.
//!
//! The tree has the shape `root/productGroup/app/build`. Listing and
//! removal work on app and build directory names supplied by a caller,
//! so every name is validated against path traversal before it touches
//! the filesystem.

pub mod list;
pub mod remove;

pub use list::{DeploymentGroup, list_deployments};
pub use remove::{remove_app, remove_build};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FileOpsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("not found: {0}")]
    NotFound(PathBuf),
}

/// Rejects names that could escape their directory.
pub(crate) fn validate_name(name: &str) -> Result<(), FileOpsError> {
    let bad = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if bad {
        return Err(FileOpsError::InvalidName(name.to_string()));
    }
    Ok(())
}

//! Launch shortcut construction and publication.
//!
//! Shortcuts are built in a private temp location first and then copied to
//! the target's shared folder; writing shortcut metadata directly over a
//! network share has a history of odd failures. The platform-specific
//! artifact format is isolated behind [`ShortcutWriter`] so tests and
//! non-Windows hosts get a working implementation.

pub mod publisher;
pub mod writer;

pub use publisher::{PublisherConfig, ShortcutPublisher};
pub use writer::{LauncherScriptWriter, NoopShortcutWriter, ShortcutSpec, ShortcutWriter};

/// Errors produced while building or publishing a shortcut.
#[derive(Debug, thiserror::Error)]
pub enum ShortcutError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shortcut artifact was not written: {0}")]
    NotWritten(std::path::PathBuf),
}

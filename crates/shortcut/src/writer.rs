//! Shortcut artifact writers.

use std::path::Path;

use crate::ShortcutError;

/// Everything a writer needs to produce one launch shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutSpec {
    /// Display name, e.g. `Trader 1.2.0 Dev`.
    pub name: String,
    /// Target executable path as seen on the machine that will run it.
    pub target: String,
    pub working_dir: String,
    /// Launch arguments; empty when the environment travels as a path
    /// segment instead.
    pub arguments: String,
}

/// Capability interface for producing a platform shortcut artifact.
pub trait ShortcutWriter: Send + Sync {
    /// File extension of the produced artifact, without the dot.
    fn extension(&self) -> &str;

    /// Writes the artifact at `path`. The file must exist afterwards.
    fn write(&self, path: &Path, shortcut: &ShortcutSpec) -> Result<(), ShortcutError>;
}

/// Default writer: a small launcher script.
///
/// COM-based `.lnk` creation only exists on Windows; a `.cmd` launcher
/// carries the same target, working directory and arguments, and the
/// publisher pipeline (build in temp, verify, copy to share) is identical.
#[derive(Debug, Clone, Default)]
pub struct LauncherScriptWriter;

impl ShortcutWriter for LauncherScriptWriter {
    fn extension(&self) -> &str {
        "cmd"
    }

    fn write(&self, path: &Path, shortcut: &ShortcutSpec) -> Result<(), ShortcutError> {
        let mut script = String::new();
        script.push_str("@echo off\r\n");
        script.push_str(&format!("rem {}\r\n", shortcut.name));
        script.push_str(&format!("cd /d \"{}\"\r\n", shortcut.working_dir));
        if shortcut.arguments.is_empty() {
            script.push_str(&format!("start \"\" \"{}\"\r\n", shortcut.target));
        } else {
            script.push_str(&format!(
                "start \"\" \"{}\" {}\r\n",
                shortcut.target, shortcut.arguments
            ));
        }
        std::fs::write(path, script)?;
        Ok(())
    }
}

/// Test double: writes an empty placeholder file so the publisher's
/// verify-then-copy pipeline still runs.
#[derive(Debug, Clone, Default)]
pub struct NoopShortcutWriter;

impl ShortcutWriter for NoopShortcutWriter {
    fn extension(&self) -> &str {
        "lnk"
    }

    fn write(&self, path: &Path, _shortcut: &ShortcutSpec) -> Result<(), ShortcutError> {
        std::fs::write(path, b"")?;
        Ok(())
    }
}

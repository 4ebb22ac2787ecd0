//! Per-file synchronization: walk, skip-if-same, copy.
//!
//! Every file decision is an explicit [`FileOutcome`] value; errors are
//! data feeding the job counters, not control flow.

use std::path::{Path, PathBuf};
use std::time::Duration;

use filetime::FileTime;
use tracing::debug;

/// Destination files whose length matches and whose mtime is within this
/// window of the source are considered already synced. Network filesystems
/// keep coarse clocks; exact equality would defeat the skip entirely.
pub const MTIME_TOLERANCE: Duration = Duration::from_secs(2);

/// Outcome of one file decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Copied,
    /// Destination already matched; counted as processed, no bytes moved.
    Skipped,
    Failed(String),
}

/// Enumerates every file under `root` recursively.
pub fn collect_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root, &mut files)?;
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            walk(&path, files)?;
        } else if metadata.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

/// Copies `src` to `dest`, or skips when the destination already matches.
///
/// The destination's parent directory is created on demand; its failure is
/// a per-file failure like any other. The source mtime is carried over to
/// the destination so the skip check holds on the next run.
pub fn sync_file(src: &Path, dest: &Path) -> FileOutcome {
    if let Some(parent) = dest.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        return FileOutcome::Failed(format!(
            "cannot create directory {}: {e}",
            parent.display()
        ));
    }

    if is_unchanged(src, dest) {
        return FileOutcome::Skipped;
    }

    if let Err(e) = std::fs::copy(src, dest) {
        return FileOutcome::Failed(format!("copy to {} failed: {e}", dest.display()));
    }

    if let Ok(meta) = src.metadata()
        && let Err(e) = filetime::set_file_mtime(dest, FileTime::from_last_modification_time(&meta))
    {
        // The bytes landed; a lost mtime only costs one redundant copy later.
        debug!(dest = %dest.display(), error = %e, "failed to carry over mtime");
    }

    FileOutcome::Copied
}

/// Same byte length and mtime within [`MTIME_TOLERANCE`].
fn is_unchanged(src: &Path, dest: &Path) -> bool {
    let (Ok(src_meta), Ok(dest_meta)) = (src.metadata(), dest.metadata()) else {
        return false;
    };
    if !dest_meta.is_file() || src_meta.len() != dest_meta.len() {
        return false;
    }
    let (Ok(src_mtime), Ok(dest_mtime)) = (src_meta.modified(), dest_meta.modified()) else {
        return false;
    };
    let delta = match src_mtime.duration_since(dest_mtime) {
        Ok(d) => d,
        Err(e) => e.duration(),
    };
    delta <= MTIME_TOLERANCE
}

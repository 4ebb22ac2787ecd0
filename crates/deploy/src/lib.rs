//! Copy orchestrator: fans out concurrent file synchronization jobs across
//! (host × selection) pairs with live progress reporting.
//!
//! Each job owns its destination subtree and its own counters, so jobs are
//! fully independent; a failing job never cancels its siblings. Progress,
//! messages and errors are pushed to a caller-supplied connection id over
//! the event channel.
//!
//! # Pipeline
//!
//! 1. **Validate** — reject empty host or selection lists up front
//! 2. **Expand** — env-less selections become one job per caller environment
//! 3. **Filter** — triples without an existing source are dropped
//! 4. **Sync** — per job: walk the source, copy or skip each file
//! 5. **Publish** — shortcut iff the job finished without file errors

pub mod orchestrator;
pub mod sync;
pub mod types;

pub use orchestrator::CopyOrchestrator;
pub use sync::{FileOutcome, MTIME_TOLERANCE, collect_files, sync_file};
pub use types::{CopyError, CopyReport, CopyRequest, JobOutcome};

//! Request, outcome and error types for the copy orchestrator.

use std::path::PathBuf;

use fleetdeploy_protocol::DeploymentSelection;

/// One copy request: every host receives every valid selection.
#[derive(Debug, Clone)]
pub struct CopyRequest {
    pub hosts: Vec<String>,
    pub selections: Vec<DeploymentSelection>,
    /// Caller-chosen environments used to expand env-less selections.
    pub environments: Vec<String>,
    /// Progress sink routing key.
    pub connection_id: String,
}

/// Counters and result of one (host, selection) job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub host: String,
    pub selection: DeploymentSelection,
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Published shortcut path, when one was created.
    pub shortcut: Option<PathBuf>,
    /// Job-level abort reason (source missing, destination not creatable).
    pub error: Option<String>,
}

impl JobOutcome {
    pub(crate) fn new(host: &str, selection: DeploymentSelection) -> Self {
        Self {
            host: host.to_string(),
            selection,
            copied: 0,
            skipped: 0,
            failed: 0,
            shortcut: None,
            error: None,
        }
    }

    /// Files processed so far.
    pub fn processed(&self) -> usize {
        self.copied + self.skipped + self.failed
    }

    pub fn succeeded(&self) -> bool {
        self.failed == 0 && self.error.is_none()
    }
}

/// Result of a whole copy batch.
#[derive(Debug, Clone)]
pub struct CopyReport {
    pub total_jobs: usize,
    pub outcomes: Vec<JobOutcome>,
}

/// Caller-visible failures of a copy request.
///
/// Per-file and per-job problems are not errors; they live in
/// [`JobOutcome`] counters and sink events.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("no target hosts selected")]
    NoHosts,

    #[error("no selections provided")]
    NoSelections,

    #[error("no valid build sources found for the chosen selections")]
    NoValidSources,

    #[error("copy batch failed: {0}")]
    Batch(String),
}

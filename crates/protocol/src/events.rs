//! Progress sink protocol.
//!
//! The copy orchestrator pushes these events to a caller-supplied channel,
//! keyed by the caller's connection id. Ordering is preserved per
//! connection id; nothing is guaranteed across ids or across jobs.

use serde::{Deserialize, Serialize};

/// One event delivered to the progress sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub connection_id: String,
    #[serde(flatten)]
    pub kind: ProgressKind,
}

/// Event payload: a percentage, an informational message, or an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ProgressKind {
    /// Completion percentage, 0..=100.
    Progress(u8),
    Message(String),
    Error(String),
}

impl ProgressEvent {
    pub fn progress(connection_id: &str, percent: u8) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            kind: ProgressKind::Progress(percent.min(100)),
        }
    }

    pub fn message(connection_id: &str, text: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            kind: ProgressKind::Message(text.into()),
        }
    }

    pub fn error(connection_id: &str, text: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            kind: ProgressKind::Error(text.into()),
        }
    }
}

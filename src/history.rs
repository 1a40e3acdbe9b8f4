use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::TaskSession;

/// Stored in place of an empty solution.
pub const NO_SOLUTION: &str = "// no solution saved";

/// Immutable snapshot of one closed-out attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based number of the variant that was active.
    #[serde(rename = "variant")]
    pub variant_number: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "completed")]
    pub was_completed: bool,
    #[serde(rename = "duration")]
    pub duration_seconds: u64,
    #[serde(rename = "code")]
    pub solution_snapshot: String,
}

impl AttemptRecord {
    /// Snapshot `session` at `at`. Idle sessions have nothing to record.
    pub fn capture(session: &TaskSession, at: DateTime<Utc>) -> Option<Self> {
        let index = session.selected_variant()?;
        let solution_snapshot = if session.solution().is_empty() {
            NO_SOLUTION.to_string()
        } else {
            session.solution().to_string()
        };

        Some(Self {
            variant_number: index + 1,
            timestamp: at,
            was_completed: session.is_completed(),
            duration_seconds: session.attempt_duration(),
            solution_snapshot,
        })
    }

    pub fn has_solution(&self) -> bool {
        self.solution_snapshot != NO_SOLUTION
    }
}

/// Read-only projection of an attempt for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptView<'a> {
    pub variant_number: usize,
    pub solution: &'a str,
}

/// Append a record built from the current snapshot and return it.
pub fn record_attempt(session: &mut TaskSession, at: DateTime<Utc>) -> Option<&AttemptRecord> {
    let record = AttemptRecord::capture(session, at)?;
    session.history.push(record);
    session.history.last()
}

pub fn view_attempt(record: &AttemptRecord) -> AttemptView<'_> {
    AttemptView {
        variant_number: record.variant_number,
        solution: &record.solution_snapshot,
    }
}

//! Pipeline execution history: one append-only record per orchestrator run.

use crate::error::CoreResult;
use crate::project::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use uuid::Uuid;

/// Final status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One pipeline run. Records are appended once, after the run finishes, and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Short unique identifier for this run.
    pub run_id: String,
    pub project_id: ProjectId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Source tables successfully re-synced vs registered.
    pub sources_synced: usize,
    pub sources_total: usize,
    pub nodes_succeeded: usize,
    pub nodes_failed: usize,
    /// Row count of the final node's output, when the run reached one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_processed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RunRecord {
    /// Start a new record for a run beginning now.
    pub fn begin(project_id: ProjectId, sources_total: usize) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            project_id,
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            sources_synced: 0,
            sources_total,
            nodes_succeeded: 0,
            nodes_failed: 0,
            rows_processed: None,
            error_message: None,
        }
    }

    /// Close the record with a final status.
    pub fn finish(&mut self, status: RunStatus, error: Option<String>) {
        self.status = status;
        self.completed_at = Some(Utc::now());
        self.error_message = error;
    }

    /// Wall-clock duration, once finished.
    pub fn duration_ms(&self) -> Option<u64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds().max(0) as u64)
    }
}

/// Append a finished record to the project's history log (JSON lines).
pub fn append_record(path: &Path, record: &RunRecord) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(record)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Load up to `limit` records from a history log, most recent first.
/// A missing file is an empty history, not an error.
pub fn load_records(path: &Path, limit: usize) -> CoreResult<Vec<RunRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: RunRecord = serde_json::from_str(&line)?;
        records.push(record);
    }
    records.reverse();
    records.truncate(limit);
    Ok(records)
}

//! Error types for wf-engine

use thiserror::Error;

/// Orchestration errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Referenced source or node does not exist (E001)
    #[error("[E001] {kind} {id} not found")]
    NotFound { kind: String, id: u64 },

    /// Join key names a column missing from its side (E002)
    #[error(
        "[E002] Column '{column}' not found in {side} table. Available columns: {}",
        available_columns.join(", ")
    )]
    ColumnNotFound {
        side: String,
        column: String,
        available_columns: Vec<String>,
    },

    /// An upstream node is failed or has never completed (E003)
    #[error("[E003] Upstream node {upstream_node_id} has not completed successfully; run it first")]
    DependencyFailed { upstream_node_id: u64 },

    /// Output requested from a node that is not in the completed state (E004)
    #[error("[E004] Node {node_id} has no output: it has not completed successfully")]
    NotReady { node_id: u64 },

    /// Too few sources re-synced to trust a pipeline run (E005)
    #[error(
        "[E005] Only {synced} of {total} sources synced; at least half must succeed before nodes run"
    )]
    SyncBelowThreshold { synced: usize, total: usize },

    /// A node exceeded the configured execution timeout (E006)
    #[error("[E006] Node {node_id} timed out after {secs}s")]
    Timeout { node_id: u64, secs: u64 },

    /// Spreadsheet connector failure (E007)
    #[error("[E007] Sheet connector error: {message}")]
    Connector { message: String },

    /// Internal invariant breakage (E008)
    #[error("[E008] Internal engine error: {0}")]
    Internal(String),

    #[error(transparent)]
    Core(#[from] wf_core::CoreError),

    #[error(transparent)]
    Db(#[from] wf_db::DbError),

    #[error(transparent)]
    Transform(#[from] wf_transform::TransformError),

    #[error(transparent)]
    Analytics(#[from] wf_analytics::AnalyticsError),
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;

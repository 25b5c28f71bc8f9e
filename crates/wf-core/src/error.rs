//! Error types for wf-core

use thiserror::Error;

/// Core error type for Weft
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Cyclic dependency between nodes
    #[error("[C003] Cyclic dependency detected between nodes: {cycle}")]
    CyclicDependency { cycle: String },

    /// C004: Project not found in the state store
    #[error("[C004] Project not found: {id}")]
    ProjectNotFound { id: u64 },

    /// C005: Node not found in the project
    #[error("[C005] Node not found: {id}")]
    NodeNotFound { id: u64 },

    /// C006: Row width does not match the column count
    #[error("[C006] Row {row} has {found} cells, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// C007: IO error
    #[error("[C007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// C008: IO error with file path context
    #[error("[C008] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

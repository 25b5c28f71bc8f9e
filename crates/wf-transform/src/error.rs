//! Error types for wf-transform

use thiserror::Error;

/// Transformation execution errors
#[derive(Error, Debug)]
pub enum TransformError {
    /// The script mixed incompatible value types (T001)
    #[error(
        "[T001] Type conversion failed during {operation}: {message}. \
         Convert the value explicitly, e.g. tostring(value), before using it"
    )]
    TypeConversion { operation: String, message: String },

    /// The script raised or failed to run (T002)
    #[error("[T002] Transformation code failed: {message}")]
    Execution { message: String },

    /// The script finished without leaving a result table in `df` (T003)
    #[error("[T003] Transformation produced no result: the script must assign its output to `df`")]
    MissingResult,
}

/// Result type alias for TransformError
pub type TransformResult<T> = Result<T, TransformError>;

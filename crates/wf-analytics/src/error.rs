//! Error types for wf-analytics

use thiserror::Error;

/// Text analytics errors
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Requested text column does not exist (A001)
    #[error("[A001] Column '{column}' not found in input table. Available columns: {}", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// The text column holds no usable text (A002)
    #[error("[A002] Column '{column}' contains no text to analyze: every value is blank or null")]
    NoTextData { column: String },

    /// The model response could not be parsed as JSON (A003)
    #[error("[A003] Model returned malformed JSON: {preview}")]
    MalformedResponse { preview: String },

    /// The completion service failed (A004)
    #[error("[A004] Completion service error: {0}")]
    Service(String),
}

/// Result type alias for AnalyticsError
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

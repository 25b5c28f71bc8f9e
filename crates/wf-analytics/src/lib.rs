//! Text analytics for Weft: sentiment classification and corpus
//! summarization over a pluggable completion model.

pub mod client;
pub mod error;
pub mod json_extract;
pub mod sentiment;
pub mod summarize;

pub use client::{CompletionClient, NullCompletionClient, RetryPolicy};
pub use error::{AnalyticsError, AnalyticsResult};
pub use sentiment::{analyze_sentiment, SentimentOutcome, SentimentRequest};
pub use summarize::{summarize, SummaryOutcome, SummaryRequest};

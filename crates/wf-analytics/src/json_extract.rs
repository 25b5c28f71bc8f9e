//! Tolerant JSON extraction from model responses.
//!
//! Models wrap JSON in code fences or prose more often than not. Strip the
//! fences, then parse the outermost array or object found in the text.

use crate::error::{AnalyticsError, AnalyticsResult};

const PREVIEW_LEN: usize = 200;

pub fn extract_json(raw: &str) -> AnalyticsResult<serde_json::Value> {
    let stripped = strip_fences(raw);
    let candidate = locate_json(stripped).unwrap_or(stripped);
    serde_json::from_str(candidate).map_err(|_| malformed(raw))
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line (```json) if present.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Slice out the outermost `[...]` or `{...}`, whichever opens first.
fn locate_json(text: &str) -> Option<&str> {
    let bracket = text.find('[');
    let brace = text.find('{');
    let (open, close) = match (bracket, brace) {
        (Some(b), Some(c)) if b < c => (b, text.rfind(']')?),
        (Some(b), None) => (b, text.rfind(']')?),
        (_, Some(c)) => (c, text.rfind('}')?),
        (None, None) => return None,
    };
    if close < open {
        return None;
    }
    Some(&text[open..=close])
}

pub fn malformed(raw: &str) -> AnalyticsError {
    let preview: String = raw.chars().take(PREVIEW_LEN).collect();
    AnalyticsError::MalformedResponse { preview }
}

//! Per-row sentiment classification.

use crate::client::{CompletionClient, RetryPolicy};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::json_extract::{extract_json, malformed};
use wf_core::{Table, Value};

pub const LABEL_COLUMN: &str = "sentiment_label";
pub const CONFIDENCE_COLUMN: &str = "sentiment_confidence";

const SYSTEM_PROMPT: &str = "You are a precise sentiment classifier. \
    You respond with JSON only, never prose.";

#[derive(Debug, Clone, Copy)]
pub struct SentimentRequest<'a> {
    pub table: &'a Table,
    pub text_column: &'a str,
    pub batch_size: usize,
}

/// Classification output: the input table widened with a label and a
/// confidence column, plus counters for the run summary.
#[derive(Debug)]
pub struct SentimentOutcome {
    pub table: Table,
    pub analyzed_rows: usize,
    pub skipped_blank: usize,
    pub failed_batches: usize,
}

/// Classify every non-blank value of `text_column`, one model call per
/// batch. A failure on the first batch aborts the whole analysis; later
/// batch failures leave those rows unlabeled and are counted.
pub async fn analyze_sentiment(
    client: &dyn CompletionClient,
    policy: &RetryPolicy,
    request: SentimentRequest<'_>,
) -> AnalyticsResult<SentimentOutcome> {
    let table = request.table;
    let col = table
        .column_index(request.text_column)
        .ok_or_else(|| AnalyticsError::ColumnNotFound {
            column: request.text_column.to_string(),
            available: table.columns().to_vec(),
        })?;

    let targets: Vec<(usize, String)> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| !row[col].is_blank())
        .map(|(i, row)| (i, row[col].to_text()))
        .collect();
    if targets.is_empty() {
        return Err(AnalyticsError::NoTextData {
            column: request.text_column.to_string(),
        });
    }
    let skipped_blank = table.row_count() - targets.len();

    // Null until a batch fills them in.
    let mut labels: Vec<(Value, Value)> = vec![(Value::Null, Value::Null); table.row_count()];
    let mut analyzed_rows = 0;
    let mut failed_batches = 0;

    let batch_size = request.batch_size.max(1);
    for (batch_no, batch) in targets.chunks(batch_size).enumerate() {
        let user = batch_prompt(batch);
        let response = policy.run(|| client.complete(SYSTEM_PROMPT, &user)).await;
        let parsed = response.and_then(|raw| parse_batch(&raw, batch.len()));
        match parsed {
            Ok(results) => {
                for ((row_idx, _), (label, confidence)) in batch.iter().zip(results) {
                    labels[*row_idx] = (Value::Text(label), Value::Float(confidence));
                    analyzed_rows += 1;
                }
            }
            Err(err) if batch_no == 0 => return Err(err),
            Err(err) => {
                log::warn!("sentiment batch {} failed, rows left unlabeled: {}", batch_no + 1, err);
                failed_batches += 1;
            }
        }
    }

    let mut columns = table.columns().to_vec();
    columns.push(LABEL_COLUMN.to_string());
    columns.push(CONFIDENCE_COLUMN.to_string());
    let mut out = Table::new(columns);
    for (row, (label, confidence)) in table.rows().iter().zip(labels) {
        let mut cells = row.clone();
        cells.push(label);
        cells.push(confidence);
        out.push_row(cells)
            .map_err(|e| AnalyticsError::Service(e.to_string()))?;
    }

    Ok(SentimentOutcome {
        table: out,
        analyzed_rows,
        skipped_blank,
        failed_batches,
    })
}

fn batch_prompt(batch: &[(usize, String)]) -> String {
    let mut prompt = String::from(
        "Classify the sentiment of each numbered text as Positive, Negative or Neutral.\n\
         Return a JSON array with exactly one object per text, in order, of the form\n\
         {\"label\": \"Positive\", \"confidence\": 0.95}. Confidence is between 0 and 1.\n\nTexts:\n",
    );
    for (i, (_, text)) in batch.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, text));
    }
    prompt
}

fn parse_batch(raw: &str, expected: usize) -> AnalyticsResult<Vec<(String, f64)>> {
    let value = extract_json(raw)?;
    let items = value.as_array().ok_or_else(|| malformed(raw))?;
    if items.len() != expected {
        return Err(malformed(raw));
    }
    Ok(items
        .iter()
        .map(|item| {
            let label = normalize_label(item.get("label").and_then(|l| l.as_str()).unwrap_or(""));
            let confidence = item
                .get("confidence")
                .and_then(|c| c.as_f64())
                .unwrap_or(0.0)
                .clamp(0.0, 1.0);
            (label, confidence)
        })
        .collect())
}

/// Labels the model invents collapse to Neutral.
fn normalize_label(raw: &str) -> String {
    match raw.trim().to_ascii_lowercase().as_str() {
        "positive" => "Positive".to_string(),
        "negative" => "Negative".to_string(),
        _ => "Neutral".to_string(),
    }
}

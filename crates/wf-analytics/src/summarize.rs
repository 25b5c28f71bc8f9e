//! Corpus summarization, optionally grouped and with sentiment roll-ups.

use crate::client::{CompletionClient, RetryPolicy};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::json_extract::{extract_json, malformed};
use wf_core::{Table, Value};

pub const SUMMARY_COLUMN: &str = "overall_summary";
pub const HIGHLIGHTS_COLUMN: &str = "bullet_highlights";
pub const ACTIONS_COLUMN: &str = "suggested_actions";
pub const METHOD_COLUMN: &str = "method_note";

const SYSTEM_PROMPT: &str = "You are an analyst who distills collections of free-text \
    feedback. You respond with JSON only, never prose.";

#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub table: &'a Table,
    pub text_column: &'a str,
    /// Summarize per distinct value of this column instead of the whole
    /// corpus. Rows with a blank group value are ignored.
    pub group_by: Option<&'a str>,
    /// Append sentiment roll-up counts computed from an existing label
    /// column.
    pub fold_sentiment: bool,
    /// Label column for the roll-up; defaults to the sentiment stage's
    /// output column.
    pub sentiment_column: Option<&'a str>,
}

#[derive(Debug)]
pub struct SummaryOutcome {
    pub table: Table,
    pub summarized_texts: usize,
    pub failed_groups: usize,
}

struct SummaryParts {
    summary: String,
    highlights: String,
    actions: String,
    /// Model's own note on how it summarized; absent when the response
    /// omits it.
    method_note: Option<String>,
}

/// Summarize the text column, one model call per group (or one for the
/// whole table). In grouped mode a failed group keeps its row with null
/// summary cells; in ungrouped mode the failure propagates.
pub async fn summarize(
    client: &dyn CompletionClient,
    policy: &RetryPolicy,
    request: SummaryRequest<'_>,
) -> AnalyticsResult<SummaryOutcome> {
    let table = request.table;
    let text_col = require_column(table, request.text_column)?;

    let sentiment_col = if request.fold_sentiment {
        let name = request
            .sentiment_column
            .unwrap_or(crate::sentiment::LABEL_COLUMN);
        Some(require_column(table, name)?)
    } else {
        None
    };

    let mut columns = Vec::new();
    let group_col = match request.group_by {
        Some(name) => {
            let idx = require_column(table, name)?;
            columns.push(name.to_string());
            Some(idx)
        }
        None => None,
    };
    columns.extend(
        [SUMMARY_COLUMN, HIGHLIGHTS_COLUMN, ACTIONS_COLUMN, METHOD_COLUMN]
            .iter()
            .map(|c| c.to_string()),
    );
    if sentiment_col.is_some() {
        columns.extend(
            [
                "total_positive_reviews",
                "total_negative_reviews",
                "percent_positive_reviews",
                "percent_negative_reviews",
            ]
            .iter()
            .map(|c| c.to_string()),
        );
    }
    let mut out = Table::new(columns);

    let mut summarized_texts = 0;
    let mut failed_groups = 0;

    match group_col {
        None => {
            let rows: Vec<usize> = (0..table.row_count()).collect();
            let texts = collect_texts(table, text_col, &rows);
            if texts.is_empty() {
                return Err(AnalyticsError::NoTextData {
                    column: request.text_column.to_string(),
                });
            }
            summarized_texts = texts.len();
            let parts = summarize_corpus(client, policy, &texts).await?;
            let mut cells = summary_cells(parts);
            if let Some(idx) = sentiment_col {
                cells.extend(sentiment_rollup(table, idx, &rows));
            }
            push(&mut out, cells)?;
        }
        Some(gidx) => {
            let groups = group_rows(table, gidx);
            if groups.is_empty() {
                return Err(AnalyticsError::NoTextData {
                    column: request.text_column.to_string(),
                });
            }
            for (group_value, rows) in groups {
                let texts = collect_texts(table, text_col, &rows);
                if texts.is_empty() {
                    continue;
                }
                let mut cells = vec![group_value];
                match summarize_corpus(client, policy, &texts).await {
                    Ok(parts) => {
                        summarized_texts += texts.len();
                        cells.extend(summary_cells(parts));
                    }
                    Err(err) => {
                        log::warn!("summary for group {:?} failed: {}", cells[0], err);
                        failed_groups += 1;
                        cells.extend([Value::Null, Value::Null, Value::Null, Value::Null]);
                    }
                }
                if let Some(idx) = sentiment_col {
                    cells.extend(sentiment_rollup(table, idx, &rows));
                }
                push(&mut out, cells)?;
            }
        }
    }

    Ok(SummaryOutcome {
        table: out,
        summarized_texts,
        failed_groups,
    })
}

fn require_column(table: &Table, name: &str) -> AnalyticsResult<usize> {
    table
        .column_index(name)
        .ok_or_else(|| AnalyticsError::ColumnNotFound {
            column: name.to_string(),
            available: table.columns().to_vec(),
        })
}

fn collect_texts(table: &Table, col: usize, rows: &[usize]) -> Vec<String> {
    rows.iter()
        .map(|&r| &table.rows()[r][col])
        .filter(|v| !v.is_blank())
        .map(|v| v.to_text())
        .collect()
}

/// Distinct non-blank group values in first-appearance order, with the row
/// indices belonging to each.
fn group_rows(table: &Table, gidx: usize) -> Vec<(Value, Vec<usize>)> {
    let mut groups: Vec<(Value, Vec<usize>)> = Vec::new();
    for (i, row) in table.rows().iter().enumerate() {
        let value = &row[gidx];
        if value.is_blank() {
            continue;
        }
        let key = value.canonical();
        match groups.iter_mut().find(|(v, _)| v.canonical() == key) {
            Some((_, rows)) => rows.push(i),
            None => groups.push((value.clone(), vec![i])),
        }
    }
    groups
}

async fn summarize_corpus(
    client: &dyn CompletionClient,
    policy: &RetryPolicy,
    texts: &[String],
) -> AnalyticsResult<SummaryParts> {
    let mut user = String::from(
        "Summarize the following texts. Return a JSON object of the form\n\
         {\"summary\": \"...\", \"highlights\": [\"...\"], \"actions\": [\"...\"], \"method_note\": \"...\"}\n\
         where highlights are the recurring themes, actions are concrete follow-ups,\n\
         and method_note is one sentence on how you grouped the material.\n\nTexts:\n",
    );
    for (i, text) in texts.iter().enumerate() {
        user.push_str(&format!("{}. {}\n", i + 1, text));
    }

    let raw = policy.run(|| client.complete(SYSTEM_PROMPT, &user)).await?;
    let value = extract_json(&raw)?;
    let obj = value.as_object().ok_or_else(|| malformed(&raw))?;
    let summary = obj
        .get("summary")
        .and_then(|s| s.as_str())
        .ok_or_else(|| malformed(&raw))?
        .to_string();
    Ok(SummaryParts {
        summary,
        highlights: join_list(obj.get("highlights")),
        actions: join_list(obj.get("actions")),
        method_note: obj
            .get("method_note")
            .and_then(|m| m.as_str())
            .map(str::to_string),
    })
}

fn join_list(value: Option<&serde_json::Value>) -> String {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default()
}

fn summary_cells(parts: SummaryParts) -> Vec<Value> {
    vec![
        Value::Text(parts.summary),
        Value::Text(parts.highlights),
        Value::Text(parts.actions),
        parts.method_note.map(Value::Text).unwrap_or(Value::Null),
    ]
}

/// Positive/negative counts and percentages over the labeled rows of the
/// group, percentages rounded to one decimal.
fn sentiment_rollup(table: &Table, label_col: usize, rows: &[usize]) -> Vec<Value> {
    let mut positive = 0i64;
    let mut negative = 0i64;
    let mut labeled = 0i64;
    for &r in rows {
        let label = &table.rows()[r][label_col];
        if label.is_blank() {
            continue;
        }
        labeled += 1;
        match label.to_text().trim().to_ascii_lowercase().as_str() {
            "positive" => positive += 1,
            "negative" => negative += 1,
            _ => {}
        }
    }
    let percent = |count: i64| -> f64 {
        if labeled == 0 {
            0.0
        } else {
            (count as f64 / labeled as f64 * 1000.0).round() / 10.0
        }
    };
    vec![
        Value::Int(positive),
        Value::Int(negative),
        Value::Float(percent(positive)),
        Value::Float(percent(negative)),
    ]
}

fn push(out: &mut Table, cells: Vec<Value>) -> AnalyticsResult<()> {
    out.push_row(cells)
        .map_err(|e| AnalyticsError::Service(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RetryPolicy;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedClient {
        responses: Mutex<VecDeque<AnalyticsResult<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<AnalyticsResult<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _system: &str, user: &str) -> AnalyticsResult<String> {
            self.prompts.lock().unwrap().push(user.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AnalyticsError::Service("script exhausted".to_string())))
        }
    }

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        }
    }

    fn summary_json(summary: &str) -> String {
        format!(
            r#"{{"summary": "{summary}", "highlights": ["fast", "cheap"], "actions": ["restock"], "method_note": "thematic grouping"}}"#
        )
    }

    fn feedback() -> Table {
        Table::with_rows(
            vec![
                "region".to_string(),
                "review".to_string(),
                "sentiment_label".to_string(),
            ],
            vec![
                vec![
                    Value::Text("east".into()),
                    Value::Text("Great".into()),
                    Value::Text("Positive".into()),
                ],
                vec![
                    Value::Text("east".into()),
                    Value::Text("Fine".into()),
                    Value::Text("Neutral".into()),
                ],
                vec![
                    Value::Text("east".into()),
                    Value::Text("Bad".into()),
                    Value::Text("Negative".into()),
                ],
                vec![
                    Value::Text("west".into()),
                    Value::Text("Slow".into()),
                    Value::Text("Negative".into()),
                ],
                vec![
                    Value::Text("west".into()),
                    Value::Text("Quick".into()),
                    Value::Text("Positive".into()),
                ],
                vec![
                    Value::Text("west".into()),
                    Value::Text("Okay".into()),
                    Value::Text("Positive".into()),
                ],
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_whole_corpus_summary() {
        let client = ScriptedClient::new(vec![Ok(summary_json("mixed feedback"))]);
        let outcome = summarize(
            &client,
            &quick_policy(),
            SummaryRequest {
                table: &feedback(),
                text_column: "review",
                group_by: None,
                fold_sentiment: false,
                sentiment_column: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.table.row_count(), 1);
        assert_eq!(
            outcome.table.columns(),
            &["overall_summary", "bullet_highlights", "suggested_actions", "method_note"]
        );
        assert_eq!(
            outcome.table.rows()[0][0],
            Value::Text("mixed feedback".into())
        );
        assert_eq!(
            outcome.table.rows()[0][1],
            Value::Text("fast; cheap".into())
        );
        // The method note is whatever the model reported, verbatim.
        assert_eq!(
            outcome.table.rows()[0][3],
            Value::Text("thematic grouping".into())
        );
        assert_eq!(outcome.summarized_texts, 6);
    }

    #[tokio::test]
    async fn test_missing_method_note_is_null() {
        let client = ScriptedClient::new(vec![Ok(
            r#"{"summary": "terse", "highlights": [], "actions": []}"#.to_string(),
        )]);
        let outcome = summarize(
            &client,
            &quick_policy(),
            SummaryRequest {
                table: &feedback(),
                text_column: "review",
                group_by: None,
                fold_sentiment: false,
                sentiment_column: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.table.rows()[0][0], Value::Text("terse".into()));
        assert_eq!(outcome.table.rows()[0][3], Value::Null);
    }

    #[tokio::test]
    async fn test_grouped_summary_isolates_groups() {
        let client = ScriptedClient::new(vec![
            Ok(summary_json("east view")),
            Ok(summary_json("west view")),
        ]);
        let outcome = summarize(
            &client,
            &quick_policy(),
            SummaryRequest {
                table: &feedback(),
                text_column: "review",
                group_by: Some("region"),
                fold_sentiment: false,
                sentiment_column: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.table.row_count(), 2);
        assert_eq!(outcome.table.rows()[0][0], Value::Text("east".into()));
        assert_eq!(outcome.table.rows()[1][0], Value::Text("west".into()));

        // Each call only sees its own group's texts.
        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].contains("Great") && !prompts[0].contains("Slow"));
        assert!(prompts[1].contains("Slow") && !prompts[1].contains("Great"));
    }

    #[tokio::test]
    async fn test_sentiment_rollup_percentages() {
        let client = ScriptedClient::new(vec![
            Ok(summary_json("east view")),
            Ok(summary_json("west view")),
        ]);
        let outcome = summarize(
            &client,
            &quick_policy(),
            SummaryRequest {
                table: &feedback(),
                text_column: "review",
                group_by: Some("region"),
                fold_sentiment: true,
                sentiment_column: None,
            },
        )
        .await
        .unwrap();

        let east = &outcome.table.rows()[0];
        assert_eq!(east[5], Value::Int(1)); // positives
        assert_eq!(east[6], Value::Int(1)); // negatives
        assert_eq!(east[7], Value::Float(33.3));
        assert_eq!(east[8], Value::Float(33.3));

        let west = &outcome.table.rows()[1];
        assert_eq!(west[5], Value::Int(2));
        assert_eq!(west[7], Value::Float(66.7));
    }

    #[tokio::test]
    async fn test_group_failure_keeps_row_with_null_cells() {
        let client = ScriptedClient::new(vec![
            Ok(summary_json("east view")),
            Err(AnalyticsError::Service("down".to_string())),
        ]);
        let outcome = summarize(
            &client,
            &quick_policy(),
            SummaryRequest {
                table: &feedback(),
                text_column: "review",
                group_by: Some("region"),
                fold_sentiment: false,
                sentiment_column: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.failed_groups, 1);
        assert_eq!(outcome.table.row_count(), 2);
        assert_eq!(outcome.table.rows()[1][1], Value::Null);
    }

    #[tokio::test]
    async fn test_ungrouped_failure_propagates() {
        let client =
            ScriptedClient::new(vec![Err(AnalyticsError::Service("down".to_string()))]);
        let err = summarize(
            &client,
            &quick_policy(),
            SummaryRequest {
                table: &feedback(),
                text_column: "review",
                group_by: None,
                fold_sentiment: false,
                sentiment_column: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::Service(_)));
    }

    #[tokio::test]
    async fn test_fold_requires_label_column() {
        let table = Table::with_rows(
            vec!["review".to_string()],
            vec![vec![Value::Text("Great".into())]],
        )
        .unwrap();
        let client = ScriptedClient::new(vec![]);
        let err = summarize(
            &client,
            &quick_policy(),
            SummaryRequest {
                table: &table,
                text_column: "review",
                group_by: None,
                fold_sentiment: true,
                sentiment_column: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::ColumnNotFound { .. }));
    }

    #[tokio::test]
    async fn test_blank_text_column_named_in_error() {
        let table = Table::with_rows(
            vec!["review".to_string()],
            vec![vec![Value::Null], vec![Value::Text(" ".into())]],
        )
        .unwrap();
        let client = ScriptedClient::new(vec![]);
        let err = summarize(
            &client,
            &quick_policy(),
            SummaryRequest {
                table: &table,
                text_column: "review",
                group_by: None,
                fold_sentiment: false,
                sentiment_column: None,
            },
        )
        .await
        .unwrap_err();
        match err {
            AnalyticsError::NoTextData { column } => assert_eq!(column, "review"),
            other => panic!("expected NoTextData, got {other:?}"),
        }
    }
}

//! History command implementation

use anyhow::Result;
use wf_core::ProjectId;

use crate::cli::{GlobalArgs, HistoryArgs};
use crate::context::RuntimeContext;

/// Execute the history command
pub async fn execute(args: &HistoryArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let records = ctx.engine.history(ProjectId(args.project), args.limit)?;

    if records.is_empty() {
        println!("No runs recorded for project {}", args.project);
        return Ok(());
    }

    println!(
        "{:<10} {:<10} {:<17} {:>8} {:>6} {:>7} {:>8}",
        "run", "status", "started", "sync", "ok", "failed", "rows"
    );
    for record in records {
        println!(
            "{:<10} {:<10} {:<17} {:>8} {:>6} {:>7} {:>8}",
            record.run_id,
            record.status.to_string(),
            record.started_at.format("%Y-%m-%d %H:%M").to_string(),
            format!("{}/{}", record.sources_synced, record.sources_total),
            record.nodes_succeeded,
            record.nodes_failed,
            record
                .rows_processed
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        if let Some(message) = record.error_message {
            println!("           {}", message);
        }
    }
    Ok(())
}

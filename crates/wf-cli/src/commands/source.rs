//! Source command implementation

use anyhow::Result;
use wf_core::ProjectId;

use crate::cli::{GlobalArgs, SourceArgs, SourceCommands};
use crate::context::RuntimeContext;

/// Execute the source command
pub async fn execute(args: &SourceArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    match &args.command {
        SourceCommands::Add(add) => {
            let source = ctx
                .engine
                .add_source(
                    ProjectId(add.project),
                    &add.spreadsheet,
                    &add.sheet,
                    &add.title,
                )
                .await?;
            println!(
                "  ✓ source {} '{}' ({} columns, {} rows)",
                source.id,
                source.title,
                source.columns.len(),
                source.total_rows
            );
        }
        SourceCommands::Sync(sync) => {
            ctx.engine
                .sync_source(ProjectId(sync.project), sync.id)
                .await?;
            let project = ctx.engine.get_project(ProjectId(sync.project))?;
            if let Some(source) = project.source(sync.id) {
                println!("  ✓ source {} re-synced ({} rows)", sync.id, source.total_rows);
            }
        }
    }
    Ok(())
}

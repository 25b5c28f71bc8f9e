//! Run command implementation

use anyhow::{bail, Result};
use wf_core::{NodeId, NodeStatus, ProjectId, RunStatus};

use crate::cli::{GlobalArgs, RunArgs};
use crate::context::RuntimeContext;

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let project_id = ProjectId(args.project);

    match args.node {
        Some(node_id) => run_single(&ctx, project_id, NodeId(node_id)).await,
        None => run_pipeline(&ctx, project_id).await,
    }
}

async fn run_single(ctx: &RuntimeContext, project_id: ProjectId, node_id: NodeId) -> Result<()> {
    ctx.verbose(&format!("running node {} in project {}", node_id, project_id));
    match ctx.engine.run_node(project_id, node_id).await {
        Ok(node) => {
            println!(
                "  ✓ {} [{}ms] -> {}",
                node.name,
                node.last_run_ms.unwrap_or(0),
                node.warehouse_table_name()
            );
            Ok(())
        }
        Err(e) => {
            println!("  ✗ node {} - {}", node_id, e);
            bail!("node run failed")
        }
    }
}

async fn run_pipeline(ctx: &RuntimeContext, project_id: ProjectId) -> Result<()> {
    let record = ctx.engine.run_project(project_id).await?;
    let project = ctx.engine.get_project(project_id)?;

    for node in &project.nodes {
        match node.status {
            NodeStatus::Completed => println!(
                "  ✓ {} [{}ms]",
                node.name,
                node.last_run_ms.unwrap_or(0)
            ),
            NodeStatus::Failed => println!(
                "  ✗ {} - {}",
                node.name,
                node.error_message.as_deref().unwrap_or("unknown error")
            ),
            _ => {}
        }
    }

    println!(
        "\nRun {}: {} ({}/{} sources synced, {} nodes ok, {} failed{})",
        record.run_id,
        record.status,
        record.sources_synced,
        record.sources_total,
        record.nodes_succeeded,
        record.nodes_failed,
        record
            .rows_processed
            .map(|r| format!(", {} rows", r))
            .unwrap_or_default()
    );

    if record.status == RunStatus::Failed {
        if let Some(message) = &record.error_message {
            bail!("run failed: {}", message);
        }
        bail!("run failed");
    }
    Ok(())
}

//! List command implementation

use anyhow::Result;
use wf_core::ProjectId;

use crate::cli::{GlobalArgs, LsArgs};
use crate::context::RuntimeContext;

/// Execute the ls command
pub async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;

    let Some(project_id) = args.project else {
        let projects = ctx.engine.list_projects()?;
        if projects.is_empty() {
            println!("No projects yet. Create one with: weft new <name>");
            return Ok(());
        }
        println!("{:<6} {:<24} {:>8} {:>7}", "id", "name", "sources", "nodes");
        for project in projects {
            println!(
                "{:<6} {:<24} {:>8} {:>7}",
                project.id,
                project.name,
                project.sources.len(),
                project.nodes.len()
            );
        }
        return Ok(());
    };

    let project = ctx.engine.get_project(ProjectId(project_id))?;
    println!("Project {} '{}'", project.id, project.name);

    if !project.sources.is_empty() {
        println!("\nSources:");
        for source in &project.sources {
            println!(
                "  {:<4} {:<24} {:>6} rows  synced {}",
                source.id,
                source.title,
                source.total_rows,
                source
                    .last_synced
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string())
            );
        }
    }

    if !project.nodes.is_empty() {
        println!("\nNodes:");
        for node in &project.nodes {
            println!(
                "  {:<4} {:<24} {:<16} {:<10} -> {}",
                node.id,
                node.name,
                node.kind().to_string(),
                node.status.to_string(),
                node.warehouse_table_name()
            );
        }
    }
    Ok(())
}

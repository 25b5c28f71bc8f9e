//! Node command implementation

use anyhow::{Context, Result};
use std::fs;
use wf_core::{NodeOp, ProjectId};

use crate::cli::{GlobalArgs, NodeArgs};
use crate::context::RuntimeContext;

/// Execute the node command.
///
/// The operation definition file is the JSON form of a node operation, e.g.:
/// `{"kind": "join", "left": {"kind": "source", "id": 1}, ...}`.
pub async fn execute(args: &NodeArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;

    let definition = fs::read_to_string(&args.op_file)
        .with_context(|| format!("Failed to read {}", args.op_file))?;
    let op: NodeOp = serde_json::from_str(&definition)
        .with_context(|| format!("{} is not a valid operation definition", args.op_file))?;

    let node = ctx
        .engine
        .create_node(
            ProjectId(args.project),
            &args.name,
            op,
            args.output_table.clone(),
        )
        .await?;
    println!(
        "  ✓ {} node {} '{}' -> {}",
        node.kind(),
        node.id,
        node.name,
        node.warehouse_table_name()
    );
    Ok(())
}

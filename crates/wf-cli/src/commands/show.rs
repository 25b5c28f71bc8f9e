//! Show command implementation

use anyhow::Result;
use wf_core::{NodeId, ProjectId};

use crate::cli::{GlobalArgs, ShowArgs};
use crate::context::RuntimeContext;

/// Execute the show command
pub async fn execute(args: &ShowArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let table = ctx
        .engine
        .get_output(ProjectId(args.project), NodeId(args.node))
        .await?;

    println!("{}", table.columns().join(" | "));
    for row in table.rows().iter().take(args.limit) {
        let cells: Vec<String> = row.iter().map(|v| v.to_text()).collect();
        println!("{}", cells.join(" | "));
    }
    if table.row_count() > args.limit {
        println!("... ({} of {} rows shown)", args.limit, table.row_count());
    } else {
        println!("({} rows)", table.row_count());
    }
    Ok(())
}

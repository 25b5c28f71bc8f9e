//! New command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, NewArgs};
use crate::context::RuntimeContext;

/// Execute the new command
pub async fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let project = ctx
        .engine
        .create_project(&args.name, args.description.clone())?;
    println!("Created project {} '{}'", project.id, project.name);
    Ok(())
}

//! Init command implementation

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use wf_core::Config;

use crate::cli::{GlobalArgs, InitArgs};

/// Execute the init command
pub async fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    let workspace = Path::new(&global.workspace_dir);
    let config_path = workspace.join("weft.yml");
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    fs::create_dir_all(workspace).context("Failed to create workspace directory")?;
    let config = Config::with_name(&args.name);
    let yaml = serde_yaml::to_string(&config).context("Failed to render configuration")?;
    fs::write(&config_path, yaml).context("Failed to write weft.yml")?;
    fs::create_dir_all(workspace.join("sheets")).context("Failed to create sheets directory")?;

    println!("Initialized weft workspace '{}'", args.name);
    println!("  {}", config_path.display());
    println!("  {}/", workspace.join("sheets").display());
    Ok(())
}

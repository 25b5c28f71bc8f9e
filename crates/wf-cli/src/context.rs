//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wf_analytics::NullCompletionClient;
use wf_core::{Config, ProjectStore};
use wf_db::{DuckDbWarehouse, Warehouse};
use wf_engine::Engine;

use crate::cli::GlobalArgs;
use crate::connector::FileConnector;

/// Runtime context: the engine assembled from workspace configuration.
pub struct RuntimeContext {
    pub engine: Engine,
    pub verbose: bool,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let workspace = Path::new(&args.workspace_dir);
        let config_path = args
            .config
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| workspace.join("weft.yml"));
        let config = Config::load(&config_path).context("Failed to load configuration file")?;
        log::debug!("loaded workspace config '{}'", config.name);

        let store = ProjectStore::new(workspace.join(&config.state_path));
        let warehouse: Arc<dyn Warehouse> = if config.warehouse_path == ":memory:" {
            Arc::new(DuckDbWarehouse::in_memory().context("Failed to open warehouse")?)
        } else {
            Arc::new(
                DuckDbWarehouse::from_path(&workspace.join(&config.warehouse_path))
                    .context("Failed to open warehouse")?,
            )
        };
        log::debug!("warehouse backend: {}", warehouse.backend_type());
        let connector = Arc::new(FileConnector::new(workspace.join("sheets")));

        // Text-analytics nodes fail cleanly until a completion backend is
        // wired in.
        let engine = Engine::new(
            config,
            store,
            warehouse,
            connector,
            Arc::new(NullCompletionClient),
        );
        Ok(Self {
            engine,
            verbose: args.verbose,
        })
    }

    /// Print verbose output if enabled
    pub fn verbose(&self, msg: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", msg);
        }
    }
}

//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Weft - spreadsheet pipelines with transformations, joins and text
/// analytics
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to workspace directory
    #[arg(short = 'd', long, global = true, default_value = ".")]
    pub workspace_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a workspace (weft.yml and sheets/)
    Init(InitArgs),

    /// Create a new project
    New(NewArgs),

    /// Manage spreadsheet sources
    Source(SourceArgs),

    /// Create a pipeline node from an operation definition file
    Node(NodeArgs),

    /// Run a whole project pipeline, or a single node
    Run(RunArgs),

    /// List projects, or a project's sources and nodes
    Ls(LsArgs),

    /// Show run history for a project
    History(HistoryArgs),

    /// Print a node's materialized output
    Show(ShowArgs),
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Workspace name
    pub name: String,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Project name
    pub name: String,

    /// Optional project description
    #[arg(long)]
    pub description: Option<String>,
}

/// Arguments for the source command
#[derive(Args, Debug)]
pub struct SourceArgs {
    #[command(subcommand)]
    pub command: SourceCommands,
}

/// Source subcommands
#[derive(Subcommand, Debug)]
pub enum SourceCommands {
    /// Register a spreadsheet source and run its initial sync
    Add(SourceAddArgs),

    /// Re-sync a registered source
    Sync(SourceSyncArgs),
}

/// Arguments for source add
#[derive(Args, Debug)]
pub struct SourceAddArgs {
    /// Project id
    #[arg(short, long)]
    pub project: u64,

    /// Spreadsheet identifier (file stem under sheets/)
    #[arg(short, long)]
    pub spreadsheet: String,

    /// Sheet name within the spreadsheet
    #[arg(long, default_value = "Sheet1")]
    pub sheet: String,

    /// Human-readable title
    #[arg(short, long)]
    pub title: String,
}

/// Arguments for source sync
#[derive(Args, Debug)]
pub struct SourceSyncArgs {
    /// Project id
    #[arg(short, long)]
    pub project: u64,

    /// Source id
    #[arg(short, long)]
    pub id: u64,
}

/// Arguments for the node command
#[derive(Args, Debug)]
pub struct NodeArgs {
    /// Project id
    #[arg(short, long)]
    pub project: u64,

    /// Node name
    #[arg(short, long)]
    pub name: String,

    /// Path to a JSON file holding the operation definition
    #[arg(short, long)]
    pub op_file: String,

    /// Custom output table name
    #[arg(long)]
    pub output_table: Option<String>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Project id
    #[arg(short, long)]
    pub project: u64,

    /// Run only this node instead of the whole pipeline
    #[arg(short, long)]
    pub node: Option<u64>,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Project id; omit to list all projects
    #[arg(short, long)]
    pub project: Option<u64>,
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Project id
    #[arg(short, long)]
    pub project: u64,

    /// Maximum records to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Project id
    #[arg(short, long)]
    pub project: u64,

    /// Node id
    #[arg(short, long)]
    pub node: u64,

    /// Maximum rows to print
    #[arg(short, long, default_value = "25")]
    pub limit: usize,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

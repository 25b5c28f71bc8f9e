//! Weft CLI - spreadsheet pipelines with transformations, joins and text
//! analytics

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod connector;
mod context;

use cli::Cli;
use commands::{history, init, ls, new, node, run, show, source};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Init(args) => init::execute(args, &cli.global).await,
        cli::Commands::New(args) => new::execute(args, &cli.global).await,
        cli::Commands::Source(args) => source::execute(args, &cli.global).await,
        cli::Commands::Node(args) => node::execute(args, &cli.global).await,
        cli::Commands::Run(args) => run::execute(args, &cli.global).await,
        cli::Commands::Ls(args) => ls::execute(args, &cli.global).await,
        cli::Commands::History(args) => history::execute(args, &cli.global).await,
        cli::Commands::Show(args) => show::execute(args, &cli.global).await,
    }
}

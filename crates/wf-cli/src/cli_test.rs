use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_run_node_flag() {
    let cli = Cli::try_parse_from(["weft", "run", "--project", "1", "--node", "3"]).unwrap();
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.project, 1);
            assert_eq!(args.node, Some(3));
        }
        other => panic!("expected run, got {other:?}"),
    }
}

#[test]
fn test_workspace_dir_default() {
    let cli = Cli::try_parse_from(["weft", "ls"]).unwrap();
    assert_eq!(cli.global.workspace_dir, ".");
    assert!(!cli.global.verbose);
}

#[test]
fn test_source_add_defaults_sheet() {
    let cli = Cli::try_parse_from([
        "weft", "source", "add", "--project", "2", "--spreadsheet", "orders", "--title", "Orders",
    ])
    .unwrap();
    match cli.command {
        Commands::Source(args) => match args.command {
            SourceCommands::Add(add) => {
                assert_eq!(add.sheet, "Sheet1");
                assert_eq!(add.spreadsheet, "orders");
            }
            other => panic!("expected add, got {other:?}"),
        },
        other => panic!("expected source, got {other:?}"),
    }
}

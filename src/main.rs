use anyhow::Result;
use clap::Parser;
use std::io;
use std::sync::Arc;
use tfvc::adapters::{StdLocalItems, TomlWorkspaceStore};
use tfvc::cli::{CliArgs, Command};
use tfvc::config::Config;
use tfvc::services::{CommandContext, CommandOptions, Connector, Console};
use tfvc_core::app::ExitCode;
use tfvc_core::ports::PendingChangeSource;
use tracing::{error, info};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::UnrecognizedCommand
            } else {
                ExitCode::Success
            };
            std::process::exit(code.code());
        }
    };

    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::Failure
        }
    };
    info!("Exiting with {}", code);
    std::process::exit(code.code());
}

fn run(args: CliArgs) -> Result<ExitCode> {
    let config = Config::from_cli_and_file(&args)?;
    info!("Using workspace cache {}", config.cache_dir.display());

    let store = Arc::new(TomlWorkspaceStore::new(&config.cache_dir));
    let connector_store = store.clone();
    let connector: Connector = Box::new(move |uri: &str| -> Result<Box<dyn PendingChangeSource>> {
        info!("Connecting to {}", uri);
        Ok(Box::new(TomlWorkspaceStore::new(connector_store.root())))
    });

    let ctx = CommandContext::new(
        store,
        Arc::new(StdLocalItems::new()),
        connector,
        std::env::current_dir()?,
        CommandOptions {
            workspace: args.workspace.clone(),
            collection: config.collection.clone(),
            show_summary: config.ui.show_summary,
        },
    );

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let mut console = Console {
        out: &mut stdout,
        err: &mut stderr,
    };

    let code = match &args.command {
        Command::Workspaces => ctx.run_workspaces(&mut console),
        Command::Status { recursive, paths } => ctx.run_status(paths, *recursive, &mut console),
        Command::Undo { recursive, paths } => ctx.run_undo(paths, *recursive, &mut console),
    };
    ctx.close();
    code
}

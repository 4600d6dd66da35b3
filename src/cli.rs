use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "tfvc")]
#[command(about = "Command-line client for a centralized version-control server")]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the cached workspace files (overrides config)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Collection URI to limit workspaces to (overrides config)
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// Workspace to use, as name[;owner], instead of inferring it from paths
    #[arg(long, global = true)]
    pub workspace: Option<String>,

    /// Never print the end-of-operation summary
    #[arg(long, global = true)]
    pub no_summary: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List cached workspaces
    Workspaces,

    /// Show pending changes
    Status {
        /// Include items in subfolders
        #[arg(short, long)]
        recursive: bool,

        /// Local or server paths, wildcards allowed in the last segment
        paths: Vec<String>,
    },

    /// Undo pending changes
    Undo {
        /// Include items in subfolders
        #[arg(short, long)]
        recursive: bool,

        #[arg(required = true)]
        paths: Vec<String>,
    },
}

mod completion;
mod dispatch;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(name = "isopack")]
#[command(about = "Project-scoped package environment sandbox", long_about = None)]
struct Cli {
    /// Declaration file to load instead of ./isopack.toml
    #[arg(long)]
    file: Option<PathBuf>,
    /// Isolation root
    #[arg(long)]
    path: Option<PathBuf>,
    /// Local package source consumed by the installer
    #[arg(long)]
    source: Option<PathBuf>,
    /// Suppress progress output
    #[arg(long)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the sandbox location and declaration state
    Status,
    /// List the declared packages
    List,
    /// Install, activate, and reconcile the sandbox for an environment
    Activate {
        #[arg(long)]
        env: Option<String>,
        #[arg(long)]
        no_install: bool,
        #[arg(long)]
        no_cleanup: bool,
    },
    /// Remove installed packages no longer reachable from the declarations
    Clean,
    /// Print shell exports for the isolation variables
    Shellenv,
    /// Generate shell completions
    Completions { shell: Shell },
    Version,
}

fn main() -> Result<()> {
    dispatch::run_cli(Cli::parse())
}

#[cfg(test)]
mod tests;

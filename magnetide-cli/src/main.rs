//! Magnetide CLI - Command-line interface
//!
//! Runs provider searches from the terminal or starts the JSON API server.

mod commands;

use clap::Parser;
use magnetide_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "magnetide")]
#[command(about = "Normalized torrent search across public indexes")]
struct Cli {
    /// Console log level (RUST_LOG overrides)
    #[arg(long, value_enum, default_value = "warn", ignore_case = true, global = true)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), None)?;

    commands::handle_command(cli.command).await
}

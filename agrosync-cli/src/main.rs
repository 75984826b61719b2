//! AgroSync: imports soil laboratory spreadsheets into the remote store

mod api;
mod cli;
mod import;
mod sheet;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agrosync", version, about = "Soil laboratory spreadsheet importer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a spreadsheet batch into the remote store
    Import(cli::commands::ImportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => cli::commands::handle_import_command(args).await,
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use matchdesk::error::AppError;

use crate::roster::run_roster;
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Matchdesk",
    about = "Run the tournament registration service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print per-category fill and payment progress from a CSV ledger
    Roster(RosterArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct RosterArgs {
    /// Path to the registration ledger CSV
    #[arg(long)]
    pub(crate) ledger_csv: PathBuf,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Roster(args) => run_roster(args),
    }
}

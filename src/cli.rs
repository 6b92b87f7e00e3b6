use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "coinpulse")]
#[command(about = "Crypto price monitor with Telegram alerts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the monitor loop
    Run,
    /// Run a single tick now
    Tick {
        /// Treat the tick as happening at this local time (HH:MM)
        #[arg(long)]
        at: Option<String>,
        /// Use an in-memory store and log messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Show stored baselines
    Status,
    /// Fetch the market and send the summary now
    Summary,
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            commands::run::run().await;
        }
        Commands::Tick { at, dry_run } => {
            commands::tick::run(at, dry_run).await;
        }
        Commands::Status => {
            commands::status::run().await;
        }
        Commands::Summary => {
            commands::summary::run().await;
        }
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use twinvault::{cli, config, server};

#[derive(Parser)]
#[command(name = "twinvault", version, about = "Personal AI twin memory engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve,
    /// Search a user's memories from the terminal
    Search {
        /// User whose memories to search
        user_id: String,
        /// Free-text query
        query: String,
    },
    /// Show a user's memory statistics
    Stats {
        user_id: String,
    },
    /// Run database diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::TwinConfig::load()?;

    // Log to stderr so stdout stays clean for CLI output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Search { user_id, query } => {
            cli::search::search(config, &user_id, &query).await?;
        }
        Command::Stats { user_id } => {
            cli::stats::stats(&config, &user_id)?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config)?;
        }
    }

    Ok(())
}

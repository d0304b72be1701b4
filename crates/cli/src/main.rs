//! Partner Map CLI - Salesforce credential checks and data export.
//!
//! # Usage
//!
//! ```bash
//! # Verify salesforce_login.txt against the login endpoint
//! pm-cli check-credentials
//!
//! # Print one source table as JSON lines
//! pm-cli fetch accounts
//!
//! # Write the joined cart table as JSON lines
//! pm-cli export --output cart.jsonl
//! ```
//!
//! # Commands
//!
//! - `check-credentials` - Log in once and print the instance URL
//! - `fetch` - Run one stored query
//! - `export` - Fetch all tables, join them, write one row per cart item

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use partner_map_dashboard::queries::QueryKind;

mod commands;

#[derive(Parser)]
#[command(name = "pm-cli")]
#[command(author, version, about = "Partner map CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to Salesforce with the credentials file
    CheckCredentials,
    /// Run a stored query and print its records as JSON lines
    Fetch {
        /// Table to fetch (accounts, materials, orders, cart)
        table: QueryKind,
    },
    /// Fetch all tables, join them and write the cart rows as JSON lines
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so exported rows can be piped
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "partner_map_cli=info,partner_map_dashboard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let config = commands::load_config()?;

    match cli.command {
        Commands::CheckCredentials => commands::credentials::check(&config).await?,
        Commands::Fetch { table } => commands::fetch::table(&config, table).await?,
        Commands::Export { output } => commands::export::cart(&config, output.as_deref()).await?,
    }
    Ok(())
}

//! Budgets CLI
//!
//! Usage:
//!   budgets init                 Initialize database
//!   budgets serve --port 3000    Start web server
//!   budgets status               Show database status
//!   budgets users                List registered users
//!   budgets audit --limit 20     Show recent audit entries

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Serve {
            port,
            host,
            token_ttl,
        } => commands::cmd_serve(&cli.db, &host, port, token_ttl).await,
        Commands::Status => commands::cmd_status(&cli.db),
        Commands::Users => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_users(&db)
        }
        Commands::Audit { limit, user } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_audit(&db, limit, user.as_deref())
        }
    }
}

//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Budgets - Personal budget tracking backend
#[derive(Parser)]
#[command(name = "budgets")]
#[command(about = "Self-hosted budgets API server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "budgets.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    ///
    /// Requires BUDGETS_JWT_SECRET (at least 32 bytes) for signing access tokens.
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Access token lifetime in seconds (overrides BUDGETS_TOKEN_TTL)
        #[arg(long)]
        token_ttl: Option<u64>,
    },

    /// Show database status (path, size, counts)
    Status,

    /// List registered users
    Users,

    /// Show recent audit log entries
    Audit {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: i64,

        /// Only show entries for this user (email)
        #[arg(short, long)]
        user: Option<String>,
    },
}

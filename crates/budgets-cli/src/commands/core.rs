//! Core command implementations (init) and database helpers

use std::path::Path;

use anyhow::{Context, Result};
use budgets_core::Database;
use tracing::debug;

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    debug!("Opening database at {}", path_str);
    Database::open(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let users = db.count_users()?;

    println!("✅ Database initialized successfully!");
    if users > 0 {
        println!("   Existing users: {}", users);
    }
    println!();
    println!("Next steps:");
    println!("  1. Set BUDGETS_JWT_SECRET to a random string of at least 32 bytes");
    println!("  2. Start the API: budgets serve");

    Ok(())
}

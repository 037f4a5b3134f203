//! Status-related command implementations (status, users, audit)

use std::path::Path;

use anyhow::{Context, Result};
use budgets_core::Database;

use super::{open_db, truncate};

pub fn cmd_status(db_path: &Path) -> Result<()> {
    use std::fs;

    println!();
    println!("📊 Budgets Status");
    println!("   ─────────────────────────────────────────────────────────────");

    println!("   Database: {}", db_path.display());

    if !db_path.exists() {
        println!("   Size: (database not initialized)");
        println!();
        println!("   Run 'budgets init' to create it");
        println!();
        return Ok(());
    }

    if let Ok(metadata) = fs::metadata(db_path) {
        let size_kb = metadata.len() as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.1} MB", size_kb / 1024.0);
        }
    }

    match open_db(db_path) {
        Ok(db) => {
            println!();
            println!("   Users: {}", db.count_users()?);
            println!("   Budgets: {}", db.count_budgets()?);
        }
        Err(e) => {
            println!();
            println!("   ❌ Error opening database: {:#}", e);
        }
    }

    println!();
    Ok(())
}

pub fn cmd_users(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No users registered yet.");
        return Ok(());
    }

    println!();
    println!("{:<36}  {:<24}  {:<32}  CREATED", "ID", "NAME", "EMAIL");
    println!("{}", "─".repeat(116));
    for user in &users {
        println!(
            "{:<36}  {:<24}  {:<32}  {}",
            user.id,
            truncate(&user.name, 24),
            truncate(&user.email, 32),
            user.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!();
    println!("{} user(s)", users.len());

    Ok(())
}

pub fn cmd_audit(db: &Database, limit: i64, user_email: Option<&str>) -> Result<()> {
    let user_id = match user_email {
        Some(email) => {
            let user = db
                .get_user_by_email(email)?
                .with_context(|| format!("No user with email '{}'", email))?;
            Some(user.id.to_string())
        }
        None => None,
    };

    let entries = db.list_audit_log(user_id.as_deref(), limit)?;

    if entries.is_empty() {
        println!("No audit entries found.");
        return Ok(());
    }

    println!();
    println!("📜 Audit Log (latest {})", entries.len());
    println!("   ─────────────────────────────────────────────────────────────");
    for entry in &entries {
        let target = match (&entry.entity_type, &entry.entity_id) {
            (Some(kind), Some(id)) => format!("{} {}", kind, id),
            (Some(kind), None) => kind.clone(),
            _ => String::new(),
        };
        println!(
            "   {}  {:<16}  {}",
            entry.timestamp,
            entry.action,
            truncate(&target, 48)
        );
        if let Some(details) = &entry.details {
            println!("      {}", truncate(details, 80));
        }
    }
    println!();

    Ok(())
}

//! User operations

use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::error::{Error, Result};
use crate::models::{normalize_email, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let created_at_str: String = row.get(4)?;

    Ok(User {
        id: parse_uuid(0, &id_str)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Create a user. The email is stored normalized.
    ///
    /// Returns `Error::Conflict` if the email is already registered.
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let email = normalize_email(email);
        if self.get_user_by_email(&email)?.is_some() {
            return Err(Error::Conflict(format!("Email {} is already registered", email)));
        }

        let id = Uuid::new_v4();
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO users (id, name, email, password_hash) VALUES (?, ?, ?, ?)",
            params![id.to_string(), name, email, password_hash],
        );

        match inserted {
            Ok(_) => {}
            // Lost a race with a concurrent registration
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::Conflict(format!(
                    "Email {} is already registered",
                    email
                )));
            }
            Err(e) => return Err(e.into()),
        }

        self.get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("User {} not found after insert", id)))
    }

    /// Get a user by ID
    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id.to_string()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive)
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                params![normalize_email(email)],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// List all users, oldest first
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at, email",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Count registered users
    pub fn count_users(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a user and, through the foreign key, all of their budgets
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM users WHERE id = ?", params![id.to_string()])?;
        Ok(deleted > 0)
    }
}

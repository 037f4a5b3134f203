//! Budget operations
//!
//! Every query is scoped by owner: a budget belonging to another user is
//! reported exactly like a missing one.

use chrono::Datelike;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use super::{parse_date, parse_datetime, parse_uuid, Database};
use crate::error::{Error, Result};
use crate::models::{Budget, BudgetFilter, BudgetStatus, BudgetUpdate, NewBudget};

const BUDGET_COLUMNS: &str = "id, user_id, name, description, category, initial_amount, \
     spent_amount, status, start_date, end_date, month, created_at, updated_at";

fn query_budget(conn: &Connection, user_id: Uuid, id: Uuid) -> rusqlite::Result<Option<Budget>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM budgets WHERE id = ? AND user_id = ?",
            BUDGET_COLUMNS
        ),
        params![id.to_string(), user_id.to_string()],
        row_to_budget,
    )
    .optional()
}

fn row_to_budget(row: &Row) -> rusqlite::Result<Budget> {
    let id_str: String = row.get(0)?;
    let user_id_str: String = row.get(1)?;
    let status_str: String = row.get(7)?;
    let start_str: String = row.get(8)?;
    let end_str: String = row.get(9)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Budget {
        id: parse_uuid(0, &id_str)?,
        user_id: parse_uuid(1, &user_id_str)?,
        name: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        initial_amount: row.get(5)?,
        spent_amount: row.get(6)?,
        status: status_str
            .parse::<BudgetStatus>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into()))?,
        start_date: parse_date(8, &start_str)?,
        end_date: parse_date(9, &end_str)?,
        month: row.get(10)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

impl Database {
    /// Create a budget for `user_id`
    pub fn create_budget(&self, user_id: Uuid, new: &NewBudget) -> Result<Budget> {
        let new = new.validate()?;
        let id = Uuid::new_v4();
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO budgets (id, user_id, name, description, category, initial_amount,
                                 spent_amount, status, start_date, end_date, month)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                id.to_string(),
                user_id.to_string(),
                new.name,
                new.description,
                new.category,
                new.initial_amount,
                new.spent_amount.unwrap_or(0.0),
                new.status.unwrap_or_default().as_str(),
                new.start_date.format("%Y-%m-%d").to_string(),
                new.end_date.format("%Y-%m-%d").to_string(),
                new.start_date.month0(),
            ],
        )?;

        self.get_budget(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Budget {} not found after insert", id)))
    }

    /// List a user's budgets, newest period first
    pub fn list_budgets(&self, user_id: Uuid, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM budgets WHERE user_id = ?", BUDGET_COLUMNS);
        let mut values: Vec<rusqlite::types::Value> = vec![user_id.to_string().into()];

        if let Some(category) = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sql.push_str(" AND category = ? COLLATE NOCASE");
            values.push(category.to_string().into());
        }
        if let Some(month) = filter.month {
            sql.push_str(" AND month = ?");
            values.push(i64::from(month).into());
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            values.push(status.as_str().to_string().into());
        }
        sql.push_str(" ORDER BY start_date DESC, created_at DESC, rowid DESC");

        let mut stmt = conn.prepare(&sql)?;
        let budgets = stmt
            .query_map(params_from_iter(values), row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(budgets)
    }

    /// Get one of a user's budgets
    pub fn get_budget(&self, user_id: Uuid, id: Uuid) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        Ok(query_budget(&conn, user_id, id)?)
    }

    /// Apply a partial update. Returns `None` if the budget does not exist.
    ///
    /// The read, merge and write happen in one IMMEDIATE transaction so
    /// concurrent patches to different fields are serialized.
    pub fn update_budget(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &BudgetUpdate,
    ) -> Result<Option<Budget>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut budget) = query_budget(&tx, user_id, id)? else {
            return Ok(None);
        };

        if update.is_empty() {
            return Ok(Some(budget));
        }

        update.apply_to(&mut budget)?;

        tx.execute(
            r#"
            UPDATE budgets
            SET name = ?, description = ?, category = ?, initial_amount = ?,
                spent_amount = ?, status = ?, start_date = ?, end_date = ?, month = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND user_id = ?
            "#,
            params![
                budget.name,
                budget.description,
                budget.category,
                budget.initial_amount,
                budget.spent_amount,
                budget.status.as_str(),
                budget.start_date.format("%Y-%m-%d").to_string(),
                budget.end_date.format("%Y-%m-%d").to_string(),
                budget.month,
                id.to_string(),
                user_id.to_string(),
            ],
        )?;

        let updated = query_budget(&tx, user_id, id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Delete a budget. Returns `false` if it did not exist.
    pub fn delete_budget(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM budgets WHERE id = ? AND user_id = ?",
            params![id.to_string(), user_id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    /// Count budgets across all users
    pub fn count_budgets(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM budgets", [], |row| row.get(0))?;
        Ok(count)
    }
}

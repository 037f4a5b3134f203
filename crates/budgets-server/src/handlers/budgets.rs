//! Budget handlers
//!
//! All routes run behind the JWT guard and only ever see the caller's own
//! budgets.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use budgets_core::{Budget, BudgetBalance, BudgetFilter, BudgetStatus, BudgetUpdate, NewBudget};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{current_user, parse_json_body, AppError, AppState};

/// Query parameters for listing budgets
#[derive(Debug, Deserialize)]
pub struct ListBudgetsQuery {
    pub category: Option<String>,
    /// Zero-based month, 0-11
    pub month: Option<String>,
    /// pending, active, or completed
    pub status: Option<String>,
}

impl ListBudgetsQuery {
    fn into_filter(self) -> Result<BudgetFilter, AppError> {
        let month = match self.month.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let month: u32 = raw
                    .parse()
                    .map_err(|_| AppError::bad_request("month must be a number from 0 to 11"))?;
                if month > 11 {
                    return Err(AppError::bad_request("month must be a number from 0 to 11"));
                }
                Some(month)
            }
            None => None,
        };

        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<BudgetStatus>())
            .transpose()
            .map_err(|_| {
                AppError::bad_request("status must be one of: pending, active, completed")
            })?;

        Ok(BudgetFilter {
            category: self.category.filter(|c| !c.trim().is_empty()),
            month,
            status,
        })
    }
}

/// Response for a deleted budget
#[derive(Serialize)]
pub struct DeleteBudgetResponse {
    pub message: String,
}

fn parse_budget_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request("Budget id must be a valid UUID"))
}

fn budget_not_found(id: Uuid) -> AppError {
    AppError::not_found(&format!("Budget {} not found", id))
}

/// POST /budgets - Create a budget for the caller
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Budget>), AppError> {
    let caller = current_user(&request)?;
    let req: NewBudget = parse_json_body(request).await?;

    let budget = state
        .db
        .create_budget(caller.id, &req)
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        Some(&caller.id.to_string()),
        "create",
        Some("budget"),
        Some(&budget.id.to_string()),
        Some(&format!(
            "name={}, category={}, initial_amount={}",
            budget.name, budget.category, budget.initial_amount
        )),
    )?;

    Ok((StatusCode::CREATED, Json(budget)))
}

/// GET /budgets - List the caller's budgets, optionally filtered
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListBudgetsQuery>,
    request: Request,
) -> Result<Json<Vec<Budget>>, AppError> {
    let caller = current_user(&request)?;
    let filter = params.into_filter()?;

    let budgets = state.db.list_budgets(caller.id, &filter)?;

    // Audit log - read access
    state.db.log_audit(
        Some(&caller.id.to_string()),
        "list",
        Some("budget"),
        None,
        Some(&format!("count={}", budgets.len())),
    )?;

    Ok(Json(budgets))
}

/// GET /budgets/:id - Get a single budget
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<Budget>, AppError> {
    let caller = current_user(&request)?;
    let id = parse_budget_id(&id)?;

    let budget = state
        .db
        .get_budget(caller.id, id)?
        .ok_or_else(|| budget_not_found(id))?;

    state.db.log_audit(
        Some(&caller.id.to_string()),
        "get",
        Some("budget"),
        Some(&id.to_string()),
        None,
    )?;

    Ok(Json(budget))
}

/// PATCH /budgets/:id - Partially update a budget
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<Budget>, AppError> {
    let caller = current_user(&request)?;
    let id = parse_budget_id(&id)?;
    let update: BudgetUpdate = parse_json_body(request).await?;

    let budget = state
        .db
        .update_budget(caller.id, id, &update)
        .map_err(AppError::from_core)?
        .ok_or_else(|| budget_not_found(id))?;

    state.db.log_audit(
        Some(&caller.id.to_string()),
        "update",
        Some("budget"),
        Some(&id.to_string()),
        None,
    )?;

    Ok(Json(budget))
}

/// DELETE /budgets/:id - Delete a budget
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<DeleteBudgetResponse>, AppError> {
    let caller = current_user(&request)?;
    let id = parse_budget_id(&id)?;

    if !state.db.delete_budget(caller.id, id)? {
        return Err(budget_not_found(id));
    }

    state.db.log_audit(
        Some(&caller.id.to_string()),
        "delete",
        Some("budget"),
        Some(&id.to_string()),
        None,
    )?;

    Ok(Json(DeleteBudgetResponse {
        message: format!("Budget {} deleted successfully", id),
    }))
}

/// GET /budgets/:id/balance - Spent and remaining amounts for a budget
pub async fn get_budget_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<BudgetBalance>, AppError> {
    let caller = current_user(&request)?;
    let id = parse_budget_id(&id)?;

    let budget = state
        .db
        .get_budget(caller.id, id)?
        .ok_or_else(|| budget_not_found(id))?;

    state.db.log_audit(
        Some(&caller.id.to_string()),
        "balance",
        Some("budget"),
        Some(&id.to_string()),
        None,
    )?;

    Ok(Json(budget.balance()))
}

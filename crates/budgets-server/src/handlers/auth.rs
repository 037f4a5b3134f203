//! Authentication-related handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use budgets_core::models::{validate_email, validate_password, validate_user_name};
use budgets_core::{hash_password, verify_password, PublicUser, User};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{current_user, parse_json_body, AppError, AppState};

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued token plus the user it belongs to
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: PublicUser,
}

fn issue_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let access_token = state.tokens.issue(&user)?;
    Ok(AuthResponse {
        access_token,
        user: user.into(),
    })
}

/// Local credential guard: email + password must match a stored user
///
/// Unknown emails and wrong passwords are reported identically.
async fn local_auth_guard(state: &AppState, email: &str, password: &str) -> Result<User, AppError> {
    let invalid = || AppError::unauthorized("Invalid email or password");

    let Some(user) = state.db.get_user_by_email(email)? else {
        return Err(invalid());
    };

    let password = password.to_string();
    let stored_hash = user.password_hash.clone();
    let matches =
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await??;

    if matches {
        Ok(user)
    } else {
        Err(invalid())
    }
}

/// POST /auth/register - Create an account and return an access token
pub async fn register(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let req: RegisterRequest = parse_json_body(request).await?;

    let name = validate_user_name(&req.name).map_err(AppError::from_core)?;
    let email = validate_email(&req.email).map_err(AppError::from_core)?;
    validate_password(&req.password).map_err(AppError::from_core)?;

    // Hashing is CPU-bound
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let user = state
        .db
        .create_user(&name, &email, &password_hash)
        .map_err(AppError::from_core)?;
    let user_id = user.id.to_string();

    state.db.log_audit(
        Some(&user_id),
        "register",
        Some("user"),
        Some(&user_id),
        Some(&format!("email={}", user.email)),
    )?;
    info!(user = %user.email, "User registered");

    let response = issue_response(&state, user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Exchange credentials for an access token
pub async fn login(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let req: LoginRequest = parse_json_body(request).await?;

    let user = match local_auth_guard(&state, &req.email, &req.password).await {
        Ok(user) => user,
        Err(e) => {
            if e.status() == StatusCode::UNAUTHORIZED {
                warn!(email = %req.email.trim(), "Failed login attempt");
                state.db.log_audit(
                    None,
                    "login_failed",
                    Some("user"),
                    None,
                    Some(&format!("email={}", req.email.trim())),
                )?;
            }
            return Err(e);
        }
    };
    let user_id = user.id.to_string();

    state
        .db
        .log_audit(Some(&user_id), "login", Some("user"), Some(&user_id), None)?;
    info!(user = %user.email, "User logged in");

    let response = issue_response(&state, user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /auth/me - Get the currently authenticated user
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<PublicUser>, AppError> {
    let caller = current_user(&request)?;

    let user = state
        .db
        .get_user(caller.id)?
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let user_id = user.id.to_string();
    state
        .db
        .log_audit(Some(&user_id), "view", Some("user"), Some(&user_id), None)?;

    Ok(Json(user.into()))
}

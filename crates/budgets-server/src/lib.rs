//! Budgets Web Server
//!
//! Axum-based REST API for user accounts and per-user budgets.
//!
//! Security features:
//! - JWT bearer authentication on every budget route
//! - Argon2id password hashing
//! - Restrictive CORS policy
//! - Audit logging for all API access (reads and writes)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use budgets_core::Database;
use serde::de::DeserializeOwned;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

mod handlers;
pub mod token;

pub use token::{JwtConfig, TokenService, DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL};

/// Maximum accepted JSON body size (10 KB)
pub const MAX_BODY_SIZE: usize = 1024 * 10;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Access token signing configuration
    pub jwt: JwtConfig,
}

impl ServerConfig {
    pub fn new(jwt: JwtConfig) -> Self {
        Self {
            allowed_origins: vec![],
            jwt,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub tokens: TokenService,
}

/// The caller identity established by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// JWT guard - requires a valid `Authorization: Bearer <token>` header
///
/// The token must carry a valid HS256 signature, must not be expired, and
/// its subject must still exist. On success the caller is attached to the
/// request as an [`AuthUser`] extension.
async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        warn!(path = %path, "Unauthorized request - missing bearer token");
        return unauthorized_response();
    };

    let claims = match state.tokens.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, path = %path, "Invalid access token");
            return unauthorized_response();
        }
    };

    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        warn!(sub = %claims.sub, path = %path, "Access token subject is not a user id");
        return unauthorized_response();
    };

    match state.db.get_user(user_id) {
        Ok(Some(user)) => {
            debug!(user = %user.email, path = %path, "Authenticated via bearer token");
            request.extensions_mut().insert(AuthUser {
                id: user.id,
                email: user.email,
            });
            next.run(request).await
        }
        Ok(None) => {
            warn!(user_id = %user_id, path = %path, "Access token for unknown user");
            unauthorized_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Get the authenticated caller attached by the JWT guard
pub(crate) fn current_user(request: &Request) -> Result<AuthUser, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::unauthorized("Authentication required"))
}

/// Read and deserialize a JSON request body
pub(crate) async fn parse_json_body<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes: Bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let tokens = TokenService::new(&config.jwt);

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        tokens,
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        // Auth
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login));

    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::get_me))
        // Budgets
        .route(
            "/budgets",
            get(handlers::list_budgets).post(handlers::create_budget),
        )
        .route(
            "/budgets/:id",
            get(handlers::get_budget)
                .patch(handlers::update_budget)
                .delete(handlers::delete_budget),
        )
        .route("/budgets/:id/balance", get(handlers::get_budget_balance))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // Build CORS layer
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error, keeping client-facing categories
    pub fn from_core(err: budgets_core::Error) -> Self {
        match err {
            budgets_core::Error::Validation(msg) => Self::bad_request(&msg),
            budgets_core::Error::Conflict(msg) => Self::conflict(&msg),
            budgets_core::Error::NotFound(msg) => Self::not_found(&msg),
            other => other.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

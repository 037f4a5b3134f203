//! Server command implementation

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use budgets_server::{JwtConfig, ServerConfig, DEFAULT_TOKEN_TTL};
use tracing::warn;

use super::open_db;

pub const JWT_SECRET_ENV: &str = "BUDGETS_JWT_SECRET";
pub const TOKEN_TTL_ENV: &str = "BUDGETS_TOKEN_TTL";
pub const ALLOWED_ORIGINS_ENV: &str = "BUDGETS_ALLOWED_ORIGINS";

/// Resolve the access token lifetime: flag > env var > default
pub fn resolve_token_ttl(flag: Option<u64>, env_value: Option<&str>) -> Result<Duration> {
    if let Some(secs) = flag {
        return Ok(Duration::from_secs(secs));
    }
    match env_value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", TOKEN_TTL_ENV, raw))?;
            Ok(Duration::from_secs(secs))
        }
        None => Ok(DEFAULT_TOKEN_TTL),
    }
}

/// Parse a comma-separated origin list, dropping blanks
pub fn parse_allowed_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Build the server configuration from environment values
pub fn build_server_config(
    secret: Option<&str>,
    token_ttl: Duration,
    allowed_origins: Vec<String>,
) -> Result<ServerConfig> {
    let Some(secret) = secret.filter(|s| !s.trim().is_empty()) else {
        bail!(
            "{} is not set. Generate one with: openssl rand -base64 48",
            JWT_SECRET_ENV
        );
    };

    let jwt = JwtConfig::new(secret, token_ttl)
        .with_context(|| format!("Invalid {}", JWT_SECRET_ENV))?;

    let mut config = ServerConfig::new(jwt);
    config.allowed_origins = allowed_origins;
    Ok(config)
}

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, token_ttl: Option<u64>) -> Result<()> {
    let secret = std::env::var(JWT_SECRET_ENV).ok();
    let ttl_env = std::env::var(TOKEN_TTL_ENV).ok();
    let origins = parse_allowed_origins(&std::env::var(ALLOWED_ORIGINS_ENV).unwrap_or_default());

    let ttl = resolve_token_ttl(token_ttl, ttl_env.as_deref())?;
    let config = build_server_config(secret.as_deref(), ttl, origins)?;

    if host != "127.0.0.1" && host != "localhost" {
        warn!("Binding to {} exposes the API beyond this machine; put it behind TLS", host);
    }

    println!("🚀 Starting Budgets API server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    println!("   🔑 Access tokens: HS256, valid for {}s", ttl.as_secs());
    if config.allowed_origins.is_empty() {
        println!("   🌐 CORS: same-origin only");
    } else {
        println!(
            "   🌐 CORS origins: {} ({})",
            config.allowed_origins.join(", "),
            ALLOWED_ORIGINS_ENV
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;

    budgets_server::serve(db, host, port, config).await
}

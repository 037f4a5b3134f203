//! CLI command tests

use std::time::Duration;

use budgets_core::db::Database;

use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

const SECRET: &str = "0123456789abcdef0123456789abcdef";

// ========== Init / Status Tests ==========

#[test]
fn test_cmd_init_creates_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("budgets.db");

    commands::cmd_init(&path).unwrap();
    assert!(path.exists());

    // Idempotent
    commands::cmd_init(&path).unwrap();
}

#[test]
fn test_cmd_status_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.db");

    commands::cmd_status(&path).unwrap();
    assert!(!path.exists(), "status must not create the database");
}

#[test]
fn test_cmd_status_with_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("budgets.db");

    let db = commands::open_db(&path).unwrap();
    db.create_user("Ada", "ada@example.com", "hash").unwrap();
    drop(db);

    commands::cmd_status(&path).unwrap();
}

// ========== Users / Audit Tests ==========

#[test]
fn test_cmd_users_empty_and_populated() {
    let db = setup_test_db();
    commands::cmd_users(&db).unwrap();

    db.create_user("Ada", "ada@example.com", "hash").unwrap();
    db.create_user("Grace", "grace@example.com", "hash").unwrap();
    commands::cmd_users(&db).unwrap();
}

#[test]
fn test_cmd_audit_all_and_by_user() {
    let db = setup_test_db();
    let user = db.create_user("Ada", "ada@example.com", "hash").unwrap();
    let uid = user.id.to_string();
    db.log_audit(Some(&uid), "register", Some("user"), Some(&uid), None)
        .unwrap();
    db.log_audit(None, "login_failed", Some("user"), None, Some("email=x@y.z"))
        .unwrap();

    commands::cmd_audit(&db, 10, None).unwrap();
    commands::cmd_audit(&db, 10, Some("ADA@example.com")).unwrap();
}

#[test]
fn test_cmd_audit_unknown_user() {
    let db = setup_test_db();
    let err = commands::cmd_audit(&db, 10, Some("nobody@example.com")).unwrap_err();
    assert!(err.to_string().contains("nobody@example.com"));
}

// ========== Serve Configuration Tests ==========

#[test]
fn test_resolve_token_ttl_precedence() {
    assert_eq!(
        commands::resolve_token_ttl(Some(60), Some("120")).unwrap(),
        Duration::from_secs(60)
    );
    assert_eq!(
        commands::resolve_token_ttl(None, Some(" 120 ")).unwrap(),
        Duration::from_secs(120)
    );
    assert_eq!(
        commands::resolve_token_ttl(None, None).unwrap(),
        budgets_server::DEFAULT_TOKEN_TTL
    );
    assert_eq!(
        commands::resolve_token_ttl(None, Some("")).unwrap(),
        budgets_server::DEFAULT_TOKEN_TTL
    );
    assert!(commands::resolve_token_ttl(None, Some("a day")).is_err());
}

#[test]
fn test_parse_allowed_origins() {
    assert!(commands::parse_allowed_origins("").is_empty());
    assert_eq!(
        commands::parse_allowed_origins("http://localhost:5173, ,https://app.example.com"),
        vec!["http://localhost:5173", "https://app.example.com"]
    );
}

#[test]
fn test_build_server_config() {
    let config = commands::build_server_config(
        Some(SECRET),
        Duration::from_secs(300),
        vec!["http://localhost:5173".into()],
    )
    .unwrap();
    assert_eq!(config.jwt.token_ttl, Duration::from_secs(300));
    assert_eq!(config.allowed_origins, vec!["http://localhost:5173"]);
}

#[test]
fn test_build_server_config_requires_secret() {
    let ttl = Duration::from_secs(60);
    assert!(commands::build_server_config(None, ttl, vec![]).is_err());
    assert!(commands::build_server_config(Some("   "), ttl, vec![]).is_err());
    assert!(commands::build_server_config(Some("too-short"), ttl, vec![]).is_err());
}

#[test]
fn test_build_server_config_rejects_huge_token_ttl() {
    let huge = commands::resolve_token_ttl(Some(9_223_372_036_854_775_808), None).unwrap();
    assert!(commands::build_server_config(Some(SECRET), huge, vec![]).is_err());

    let max = budgets_server::MAX_TOKEN_TTL;
    assert!(commands::build_server_config(Some(SECRET), max, vec![]).is_ok());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is too long", 10), "this is...");
    assert_eq!(truncate("日本語のテキスト", 5), "日本...");
}

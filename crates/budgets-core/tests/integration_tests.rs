//! Integration tests for budgets-core
//!
//! These tests exercise the register → plan → spend → close workflow
//! through the public API only.

use budgets_core::{
    db::Database, hash_password, verify_password, BudgetFilter, BudgetStatus, BudgetUpdate,
    Error, NewBudget,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monthly_budget(name: &str, category: &str, month: u32, amount: f64) -> NewBudget {
    NewBudget {
        name: name.to_string(),
        description: None,
        category: category.to_string(),
        initial_amount: amount,
        spent_amount: None,
        status: None,
        start_date: date(2024, month, 1),
        end_date: date(2024, month, 28),
    }
}

// =============================================================================
// Full Workflow
// =============================================================================

#[test]
fn test_full_budget_lifecycle() {
    let db = Database::in_memory().expect("Failed to create database");

    // Register
    let hash = hash_password("correct horse battery").expect("Failed to hash");
    let user = db
        .create_user("Ada Lovelace", "Ada@Example.com", &hash)
        .expect("Failed to create user");
    assert_eq!(user.email, "ada@example.com");

    // Login
    let stored = db
        .get_user_by_email("ADA@example.com")
        .unwrap()
        .expect("user should exist");
    assert!(verify_password("correct horse battery", &stored.password_hash).unwrap());
    assert!(!verify_password("wrong horse", &stored.password_hash).unwrap());

    // Plan a quarter
    let jan = db
        .create_budget(user.id, &monthly_budget("Groceries", "Food", 1, 400.0))
        .unwrap();
    db.create_budget(user.id, &monthly_budget("Groceries", "Food", 2, 400.0))
        .unwrap();
    db.create_budget(user.id, &monthly_budget("Rent", "Housing", 1, 1200.0))
        .unwrap();

    assert_eq!(jan.status, BudgetStatus::Pending);
    assert_eq!(jan.month, 0);

    // Spend
    let update = BudgetUpdate {
        spent_amount: Some(300.0),
        status: Some(BudgetStatus::Active),
        ..Default::default()
    };
    let jan = db
        .update_budget(user.id, jan.id, &update)
        .unwrap()
        .expect("budget should exist");

    let balance = jan.balance();
    assert_eq!(balance.remaining_amount, 100.0);
    assert_eq!(balance.percentage_spent_amount, 75.0);
    assert_eq!(balance.percentage_remaining_amount, 25.0);

    // Report
    let food_in_january = db
        .list_budgets(
            user.id,
            &BudgetFilter {
                category: Some("food".to_string()),
                month: Some(0),
                status: None,
            },
        )
        .unwrap();
    assert_eq!(food_in_january.len(), 1);
    assert_eq!(food_in_january[0].id, jan.id);

    let active = db
        .list_budgets(
            user.id,
            &BudgetFilter {
                status: Some(BudgetStatus::Active),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(active.len(), 1);

    // Close
    let close = BudgetUpdate {
        status: Some(BudgetStatus::Completed),
        ..Default::default()
    };
    let jan = db.update_budget(user.id, jan.id, &close).unwrap().unwrap();
    assert_eq!(jan.status, BudgetStatus::Completed);
    assert_eq!(jan.spent_amount, 300.0);

    assert!(db.delete_budget(user.id, jan.id).unwrap());
    assert_eq!(db.count_budgets().unwrap(), 2);
}

// =============================================================================
// Multi-user Isolation
// =============================================================================

#[test]
fn test_users_never_see_each_other() {
    let db = Database::in_memory().unwrap();
    let alice = db.create_user("Alice", "alice@example.com", "h").unwrap();
    let bob = db.create_user("Bob", "bob@example.com", "h").unwrap();

    let secret = db
        .create_budget(alice.id, &monthly_budget("Savings", "Misc", 3, 50.0))
        .unwrap();

    assert!(db
        .list_budgets(bob.id, &BudgetFilter::default())
        .unwrap()
        .is_empty());
    assert!(db.get_budget(bob.id, secret.id).unwrap().is_none());
    assert!(db
        .update_budget(bob.id, secret.id, &BudgetUpdate::default())
        .unwrap()
        .is_none());
    assert!(!db.delete_budget(bob.id, secret.id).unwrap());

    // Still intact for the owner
    let still_there = db.get_budget(alice.id, secret.id).unwrap().unwrap();
    assert_eq!(still_there, secret);
}

#[test]
fn test_duplicate_registration_is_conflict() {
    let db = Database::in_memory().unwrap();
    db.create_user("Alice", "alice@example.com", "h").unwrap();

    let err = db
        .create_user("Alice Again", "ALICE@example.com", "h")
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(db.count_users().unwrap(), 1);
}

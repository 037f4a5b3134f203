//! Budgets Core Library
//!
//! Shared functionality for the Budgets backend:
//! - Domain models, request validation and balance computation
//! - Password hashing
//! - Database access and migrations (users, budgets, audit log)

pub mod db;
pub mod error;
pub mod models;
pub mod password;

pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    AuditEntry, Budget, BudgetBalance, BudgetFilter, BudgetStatus, BudgetUpdate, NewBudget,
    PublicUser, User,
};
pub use password::{hash_password, verify_password};

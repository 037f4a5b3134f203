//! Domain models for Budgets

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Maximum length of user and budget names
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a budget description
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length of a budget category label
pub const MAX_CATEGORY_LEN: usize = 50;

/// Largest accepted budget amount
pub const MAX_AMOUNT: f64 = 1e12;

/// Smallest non-zero budget amount (one cent)
pub const MIN_NONZERO_AMOUNT: f64 = 0.01;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered user, including the stored credential
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User as exposed over the API (no credential)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Lifecycle state of a budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for BudgetStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown budget status: {}", s)),
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A spending budget owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub initial_amount: f64,
    pub spent_amount: f64,
    pub status: BudgetStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Zero-based month of `start_date` (0 = January)
    pub month: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Spending summary for a budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetBalance {
    pub initial_amount: f64,
    pub spent_amount: f64,
    pub percentage_spent_amount: f64,
    pub remaining_amount: f64,
    pub percentage_remaining_amount: f64,
}

impl Budget {
    /// Compute how much of the budget has been spent and what is left.
    ///
    /// Percentages are relative to `initial_amount` and rounded to two
    /// decimals. A zero initial amount yields zero percentages.
    pub fn balance(&self) -> BudgetBalance {
        let remaining = self.initial_amount - self.spent_amount;
        let (spent_pct, remaining_pct) = if self.initial_amount > 0.0 {
            (
                round2(self.spent_amount / self.initial_amount * 100.0),
                round2(remaining / self.initial_amount * 100.0),
            )
        } else {
            (0.0, 0.0)
        };

        BudgetBalance {
            initial_amount: self.initial_amount,
            spent_amount: self.spent_amount,
            percentage_spent_amount: spent_pct,
            remaining_amount: remaining,
            percentage_remaining_amount: remaining_pct,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Request body for creating a budget
#[derive(Debug, Clone, Deserialize)]
pub struct NewBudget {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub initial_amount: f64,
    #[serde(default)]
    pub spent_amount: Option<f64>,
    #[serde(default)]
    pub status: Option<BudgetStatus>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewBudget {
    /// Check field constraints and return a trimmed copy
    pub fn validate(&self) -> Result<NewBudget> {
        let name = validate_label("name", &self.name, MAX_NAME_LEN)?;
        let category = validate_label("category", &self.category, MAX_CATEGORY_LEN)?;
        let description = normalize_description(self.description.as_deref())?;
        validate_amount("initial_amount", self.initial_amount)?;
        if let Some(spent) = self.spent_amount {
            validate_amount("spent_amount", spent)?;
        }
        validate_period(self.start_date, self.end_date)?;

        Ok(NewBudget {
            name,
            description,
            category,
            initial_amount: self.initial_amount,
            spent_amount: self.spent_amount,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// Partial update of a budget
///
/// Absent fields are left unchanged. `description` distinguishes between
/// absent (keep) and `null` (clear).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub initial_amount: Option<f64>,
    pub spent_amount: Option<f64>,
    pub status: Option<BudgetStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BudgetUpdate {
    /// Apply this update to an existing budget, validating the result
    pub fn apply_to(&self, budget: &mut Budget) -> Result<()> {
        if let Some(name) = &self.name {
            budget.name = validate_label("name", name, MAX_NAME_LEN)?;
        }
        if let Some(description) = &self.description {
            budget.description = normalize_description(description.as_deref())?;
        }
        if let Some(category) = &self.category {
            budget.category = validate_label("category", category, MAX_CATEGORY_LEN)?;
        }
        if let Some(amount) = self.initial_amount {
            validate_amount("initial_amount", amount)?;
            budget.initial_amount = amount;
        }
        if let Some(amount) = self.spent_amount {
            validate_amount("spent_amount", amount)?;
            budget.spent_amount = amount;
        }
        if let Some(status) = self.status {
            budget.status = status;
        }
        if let Some(start) = self.start_date {
            budget.start_date = start;
            budget.month = start.month0();
        }
        if let Some(end) = self.end_date {
            budget.end_date = end;
        }
        validate_period(budget.start_date, budget.end_date)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.initial_amount.is_none()
            && self.spent_amount.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

/// Filters for listing budgets
#[derive(Debug, Clone, Default)]
pub struct BudgetFilter {
    pub category: Option<String>,
    /// Zero-based month (0 = January)
    pub month: Option<u32>,
    pub status: Option<BudgetStatus>,
}

/// Audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub user_id: Option<String>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub details: Option<String>,
}

/// Deserialize a field where `null` is meaningful (Some(None))
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_label(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > max {
        return Err(Error::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(value: Option<&str>) -> Result<Option<String>> {
    let Some(text) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(Error::Validation(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(Some(text.to_string()))
}

fn validate_amount(field: &str, amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::Validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::Validation(format!(
            "{} must be at most {}",
            field, MAX_AMOUNT
        )));
    }
    // Keeps spent/initial ratios finite
    if amount != 0.0 && amount < MIN_NONZERO_AMOUNT {
        return Err(Error::Validation(format!(
            "{} must be 0 or at least {}",
            field, MIN_NONZERO_AMOUNT
        )));
    }
    Ok(())
}

fn validate_period(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(Error::Validation(
            "end_date must not be before start_date".to_string(),
        ));
    }
    Ok(())
}

/// Validate a display name for a new user
pub fn validate_user_name(name: &str) -> Result<String> {
    validate_label("name", name, MAX_NAME_LEN)
}

/// Lowercase and trim an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address and return its normalized form
pub fn validate_email(email: &str) -> Result<String> {
    let email = normalize_email(email);
    let invalid = || Error::Validation("email must be a valid email address".to_string());

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(invalid());
    }
    Ok(email)
}

/// Check password strength requirements
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

//! Client-side form validation.
//!
//! Each form holds the raw text a user typed. `validate()` either produces the
//! typed request body for the API or a `ValidationErrors` listing every field
//! that was rejected, so a dialog can show all messages at once.

pub mod auth;
pub mod budget;
pub mod category;
pub mod transaction;

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

pub use auth::{LoginForm, ProfileForm, RegisterForm};
pub use budget::BudgetForm;
pub use category::CategoryForm;
pub use transaction::TransactionForm;

/// Maximum decimal places the backend stores for money
const MAX_AMOUNT_DECIMALS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First message recorded for a field
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// `Ok(value)` when nothing was recorded
    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Trimmed text that must be non-empty and at most `max` characters
fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    input: &str,
    max: usize,
) -> Option<String> {
    let value = input.trim();
    if value.is_empty() {
        errors.push(field, format!("{} is required", label));
        None
    } else if value.chars().count() > max {
        errors.push(field, format!("{} must be at most {} characters", label, max));
        None
    } else {
        Some(value.to_string())
    }
}

/// Trimmed optional text, `None` when blank
fn optional_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    input: &str,
    max: usize,
) -> Option<String> {
    let value = input.trim();
    if value.is_empty() {
        None
    } else if value.chars().count() > max {
        errors.push(field, format!("{} must be at most {} characters", label, max));
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a strictly positive money amount.
///
/// Accepts `.` or `,` as the decimal separator. When both appear the comma is
/// treated as a thousands separator.
pub fn parse_amount(input: &str) -> Result<Decimal, String> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err("Amount is required".to_string());
    }

    let normalized = if raw.contains('.') {
        raw.replace(',', "")
    } else {
        raw.replace(',', ".")
    };

    let amount = Decimal::from_str(&normalized).map_err(|_| "Amount must be a number".to_string())?;
    if amount <= Decimal::ZERO {
        return Err("Amount must be positive".to_string());
    }
    if amount.normalize().scale() > MAX_AMOUNT_DECIMALS {
        return Err(format!(
            "Amount can have at most {} decimal places",
            MAX_AMOUNT_DECIMALS
        ));
    }
    Ok(amount)
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date_input(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| "Date must be in YYYY-MM-DD format".to_string())
}

/// Check a `#RRGGBB` color
pub fn is_hex_color(input: &str) -> bool {
    input.len() == 7
        && input.starts_with('#')
        && input[1..].chars().all(|c| c.is_ascii_hexdigit())
}

//! Data models for finance tracker entities.
//!
//! These mirror the backend's response and request bodies:
//!
//! - `User`, `NewUser`, `UserUpdate`, `AuthToken`: accounts and login
//! - `Category`: user-defined labels with a color and icon
//! - `Transaction`, `TransactionType`, `TransactionFilters`: income/expense records
//! - `Budget`, `BudgetPeriod`: monthly caps per category with derived usage
//! - `TransactionSummary`, `MonthlyTotals`: dashboard aggregates
//!
//! Amounts use `Decimal`. The backend serializes decimals as JSON strings, the
//! deserializer accepts either strings or numbers.

pub mod budget;
pub mod category;
pub mod summary;
pub mod transaction;
pub mod user;

pub use budget::{Budget, BudgetPeriod, BudgetUpdate, NewBudget};
pub use category::{
    category_color, category_name, parse_hex_color, Category, CategoryUpdate, NewCategory,
    DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON,
};
pub use summary::{MonthlyTotals, TransactionSummary};
pub use transaction::{
    partition_by_type, NewTransaction, Transaction, TransactionFilters, TransactionType,
    TransactionUpdate,
};
pub use user::{AuthToken, NewUser, User, UserUpdate};

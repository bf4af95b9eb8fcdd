use uuid::Uuid;

use crate::models::{Budget, BudgetPeriod, NewBudget};

use super::{parse_amount, ValidationErrors};

/// Earliest year the backend accepts for a budget
const MIN_BUDGET_YEAR: i32 = 2000;

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetForm {
    pub category_id: Option<Uuid>,
    pub amount: String,
    pub month: u32,
    pub year: i32,
}

impl BudgetForm {
    pub fn new(period: BudgetPeriod) -> Self {
        Self {
            category_id: None,
            amount: String::new(),
            month: period.month,
            year: period.year,
        }
    }

    /// Prefill from an existing budget; only the amount is editable
    pub fn from_budget(budget: &Budget) -> Self {
        Self {
            category_id: Some(budget.category_id),
            amount: budget.amount.normalize().to_string(),
            month: budget.month,
            year: budget.year,
        }
    }

    pub fn validate(&self) -> Result<NewBudget, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.category_id.is_none() {
            errors.push("category_id", "Category is required");
        }

        let amount = match parse_amount(&self.amount) {
            Ok(a) => Some(a),
            Err(message) => {
                errors.push("amount", message);
                None
            }
        };

        if !(1..=12).contains(&self.month) {
            errors.push("month", "Month must be between 1 and 12");
        }
        if self.year < MIN_BUDGET_YEAR {
            errors.push("year", format!("Year must be {} or later", MIN_BUDGET_YEAR));
        }

        errors.into_result(|| NewBudget {
            category_id: self.category_id.unwrap_or_default(),
            amount: amount.unwrap_or_default(),
            month: self.month,
            year: self.year,
        })
    }
}

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// A budget month. Months are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BudgetPeriod {
    pub year: i32,
    pub month: u32,
}

impl BudgetPeriod {
    /// Returns `None` unless `month` is in 1..=12
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month <= 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("Unknown")
    }

    /// e.g. "March 2025"
    pub fn label(&self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub spent: Option<Decimal>,
    #[serde(default)]
    pub remaining: Option<Decimal>,
    #[serde(default)]
    pub percentage_used: Option<f64>,
}

impl Budget {
    pub fn period(&self) -> BudgetPeriod {
        BudgetPeriod {
            year: self.year,
            month: self.month,
        }
    }

    /// Amount spent so far, zero when the server did not report it
    pub fn spent(&self) -> Decimal {
        self.spent.unwrap_or(Decimal::ZERO)
    }

    /// Server value, or limit minus spent. Negative when over budget.
    pub fn remaining(&self) -> Decimal {
        self.remaining
            .unwrap_or_else(|| self.amount.saturating_sub(self.spent()))
    }

    /// Server value, or spent as a percentage of the limit
    pub fn percentage_used(&self) -> f64 {
        if let Some(pct) = self.percentage_used {
            return pct;
        }
        if self.amount <= Decimal::ZERO {
            return 0.0;
        }
        self.spent()
            .checked_div(self.amount)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .and_then(|pct| pct.to_f64())
            .unwrap_or(0.0)
    }

    pub fn is_exceeded(&self) -> bool {
        self.percentage_used() > 100.0
    }

    /// Percentage for a progress bar, clamped to 0..=100
    pub fn progress(&self) -> f64 {
        let pct = self.percentage_used();
        if pct.is_nan() {
            0.0
        } else {
            pct.clamp(0.0, 100.0)
        }
    }

    /// How far over the limit the budget is; zero when not exceeded
    pub fn overage(&self) -> Decimal {
        if self.is_exceeded() {
            self.remaining().abs()
        } else {
            Decimal::ZERO
        }
    }
}

/// Body for `POST /budgets`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBudget {
    pub category_id: Uuid,
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
}

/// Body for `PATCH /budgets/{id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BudgetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

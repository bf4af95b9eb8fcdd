use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            TransactionType::Income => TransactionType::Expense,
            TransactionType::Expense => TransactionType::Income,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "Income"),
            TransactionType::Expense => write!(f, "Expense"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub user_id: Uuid,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Amount with the sign of its type applied (expenses negative)
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }

    /// Calendar date of the transaction, whatever timestamp format the server used
    pub fn date_naive(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

/// Parse an RFC 3339 timestamp, a naive ISO timestamp, or a bare `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    s.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

/// Split transactions into (income, expense), preserving order
pub fn partition_by_type(transactions: &[Transaction]) -> (Vec<&Transaction>, Vec<&Transaction>) {
    transactions.iter().partition(|t| t.is_income())
}

/// Body for `POST /transactions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body for `PATCH /transactions/{id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<NewTransaction> for TransactionUpdate {
    fn from(t: NewTransaction) -> Self {
        Self {
            description: Some(t.description),
            amount: Some(t.amount),
            kind: Some(t.kind),
            category_id: t.category_id,
            date: t.date,
            notes: t.notes,
        }
    }
}

/// Query parameters for `GET /transactions`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl TransactionFilters {
    pub fn recent(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }
}

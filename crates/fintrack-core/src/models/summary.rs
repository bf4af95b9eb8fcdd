use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::{Transaction, TransactionType};

/// Totals returned by `GET /transactions/summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    #[serde(default)]
    pub total_income: Decimal,
    #[serde(default)]
    pub total_expense: Decimal,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub transaction_count: u64,
}

impl TransactionSummary {
    /// Compute the same totals locally from a list of transactions
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut summary = Self::default();
        for t in transactions {
            match t.kind {
                TransactionType::Income => summary.total_income += t.amount,
                TransactionType::Expense => summary.total_expense += t.amount,
            }
        }
        summary.balance = summary.total_income - summary.total_expense;
        summary.transaction_count = transactions.len() as u64;
        summary
    }
}

/// One month of `GET /transactions/monthly`.
///
/// The backend labels the series in Portuguese ("receitas"/"despesas").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// Short month label as sent by the server
    pub name: String,
    #[serde(rename = "receitas", alias = "income", default)]
    pub income: Decimal,
    #[serde(rename = "despesas", alias = "expense", default)]
    pub expense: Decimal,
}

impl MonthlyTotals {
    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn txn(kind: TransactionType, cents: i64) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            description: "x".to_string(),
            amount: Decimal::new(cents, 2),
            kind,
            category_id: None,
            user_id: Uuid::nil(),
            date: "2024-01-01".to_string(),
            notes: None,
            created_at: "2024-01-01T00:00:00".to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn test_summary_from_transactions() {
        let list = vec![
            txn(TransactionType::Income, 300000),
            txn(TransactionType::Expense, 45050),
            txn(TransactionType::Expense, 4950),
        ];
        let s = TransactionSummary::from_transactions(&list);
        assert_eq!(s.total_income, Decimal::new(3000, 0));
        assert_eq!(s.total_expense, Decimal::new(500, 0));
        assert_eq!(s.balance, Decimal::new(2500, 0));
        assert_eq!(s.transaction_count, 3);
    }

    #[test]
    fn test_summary_defaults_to_zero() {
        let s = TransactionSummary::from_transactions(&[]);
        assert_eq!(s, TransactionSummary::default());
    }

    #[test]
    fn test_parse_monthly_response() {
        let json = r#"[{"name":"Jan","receitas":5000.0,"despesas":3200.5},{"name":"Fev","receitas":0.0,"despesas":0.0}]"#;
        let months: Vec<MonthlyTotals> = serde_json::from_str(json).expect("Failed to parse monthly JSON");
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].income, Decimal::new(5000, 0));
        assert_eq!(months[0].net(), Decimal::new(17995, 1));
        assert_eq!(months[1].net(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_summary_response() {
        let json = r#"{"total_income":"1500.00","total_expense":"400.00","balance":"1100.00","transaction_count":4}"#;
        let s: TransactionSummary = serde_json::from_str(json).expect("Failed to parse summary JSON");
        assert_eq!(s.balance, Decimal::new(1100, 0));
        assert_eq!(s.transaction_count, 4);
    }
}

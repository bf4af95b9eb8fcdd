use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{NewTransaction, Transaction, TransactionType, TransactionUpdate};

use super::{optional_text, parse_amount, parse_date_input, required_text, ValidationErrors};

const MAX_DESCRIPTION_LENGTH: usize = 200;
const MAX_NOTES_LENGTH: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionForm {
    pub kind: TransactionType,
    pub description: String,
    pub amount: String,
    pub category_id: Option<Uuid>,
    /// `YYYY-MM-DD`; blank lets the server use the current time
    pub date: String,
    pub notes: String,
    /// The edited transaction had notes, so blank notes must be sent to clear them
    pub had_notes: bool,
}

impl TransactionForm {
    /// Empty form of the given type dated `today`
    pub fn new(kind: TransactionType, today: NaiveDate) -> Self {
        Self {
            kind,
            description: String::new(),
            amount: String::new(),
            category_id: None,
            date: today.format("%Y-%m-%d").to_string(),
            notes: String::new(),
            had_notes: false,
        }
    }

    /// Prefill from an existing transaction for editing
    pub fn from_transaction(t: &Transaction) -> Self {
        Self {
            kind: t.kind,
            description: t.description.clone(),
            amount: t.amount.normalize().to_string(),
            category_id: t.category_id,
            date: t
                .date_naive()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            notes: t.notes.clone().unwrap_or_default(),
            had_notes: t.notes.as_deref().is_some_and(|n| !n.is_empty()),
        }
    }

    /// Only expenses are categorized
    pub fn uses_category(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn validate(&self) -> Result<NewTransaction, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let description = required_text(
            &mut errors,
            "description",
            "Description",
            &self.description,
            MAX_DESCRIPTION_LENGTH,
        );

        let amount = match parse_amount(&self.amount) {
            Ok(a) => Some(a),
            Err(message) => {
                errors.push("amount", message);
                None
            }
        };

        let date = if self.date.trim().is_empty() {
            None
        } else {
            match parse_date_input(&self.date) {
                Ok(d) => d.and_hms_opt(0, 0, 0),
                Err(message) => {
                    errors.push("date", message);
                    None
                }
            }
        };

        let notes = optional_text(&mut errors, "notes", "Notes", &self.notes, MAX_NOTES_LENGTH);

        let category_id = if self.uses_category() {
            self.category_id
        } else {
            None
        };

        errors.into_result(|| NewTransaction {
            description: description.unwrap_or_default(),
            amount: amount.unwrap_or_default(),
            kind: self.kind,
            category_id,
            date,
            notes,
        })
    }

    /// Body for `PATCH /transactions/{id}`; blank notes clear existing ones
    pub fn validate_update(&self) -> Result<TransactionUpdate, ValidationErrors> {
        let mut update = TransactionUpdate::from(self.validate()?);
        if update.notes.is_none() && self.had_notes {
            update.notes = Some(String::new());
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 15).unwrap_or_default()
    }

    fn filled(kind: TransactionType) -> TransactionForm {
        TransactionForm {
            description: "Supermarket".to_string(),
            amount: "87,90".to_string(),
            category_id: Some(Uuid::from_u128(7)),
            ..TransactionForm::new(kind, today())
        }
    }

    #[test]
    fn test_new_form_defaults_to_today() {
        let form = TransactionForm::new(TransactionType::Income, today());
        assert_eq!(form.date, "2025-04-15");
        assert_eq!(form.kind, TransactionType::Income);
    }

    #[test]
    fn test_valid_expense() {
        let body = filled(TransactionType::Expense).validate().expect("valid");
        assert_eq!(body.description, "Supermarket");
        assert_eq!(body.amount, Decimal::new(8790, 2));
        assert_eq!(body.category_id, Some(Uuid::from_u128(7)));
        assert_eq!(body.date, today().and_hms_opt(0, 0, 0));
        assert!(body.notes.is_none());
    }

    #[test]
    fn test_income_drops_category() {
        let body = filled(TransactionType::Income).validate().expect("valid");
        assert_eq!(body.kind, TransactionType::Income);
        assert!(body.category_id.is_none());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for amount in ["0", "-10", "0,00"] {
            let form = TransactionForm {
                amount: amount.to_string(),
                ..filled(TransactionType::Expense)
            };
            let errors = form.validate().expect_err("non-positive must fail");
            assert_eq!(errors.get("amount"), Some("Amount must be positive"));
        }
    }

    #[test]
    fn test_empty_description_rejected() {
        let form = TransactionForm {
            description: "   ".to_string(),
            ..filled(TransactionType::Expense)
        };
        let errors = form.validate().expect_err("blank description must fail");
        assert_eq!(errors.get("description"), Some("Description is required"));
    }

    #[test]
    fn test_bad_date_rejected_blank_date_omitted() {
        let bad = TransactionForm {
            date: "15/04/2025".to_string(),
            ..filled(TransactionType::Expense)
        };
        assert!(bad.validate().expect_err("bad date").has("date"));

        let blank = TransactionForm {
            date: String::new(),
            ..filled(TransactionType::Expense)
        };
        assert!(blank.validate().expect("blank date ok").date.is_none());
    }

    #[test]
    fn test_update_clears_removed_notes() {
        let mut form = TransactionForm {
            notes: "old note".to_string(),
            had_notes: true,
            ..filled(TransactionType::Expense)
        };
        form.notes.clear();
        let update = form.validate_update().expect("valid");
        assert_eq!(update.notes.as_deref(), Some(""));
        let body = serde_json::to_value(&update).expect("serialize");
        assert_eq!(body["notes"], "");

        form.had_notes = false;
        let update = form.validate_update().expect("valid");
        assert!(update.notes.is_none());
        let body = serde_json::to_value(&update).expect("serialize");
        assert!(body.get("notes").is_none());
    }

    #[test]
    fn test_notes_trimmed_and_limited() {
        let form = TransactionForm {
            notes: "  paid in cash ".to_string(),
            ..filled(TransactionType::Expense)
        };
        assert_eq!(form.validate().expect("valid").notes.as_deref(), Some("paid in cash"));

        let long = TransactionForm {
            notes: "n".repeat(501),
            ..filled(TransactionType::Expense)
        };
        assert!(long.validate().expect_err("long notes").has("notes"));
    }
}

//! Form dialogs for creating and editing records.
//!
//! A `FormDialog` owns one of the core form structs, tracks which field has
//! focus, and turns a valid form into a `Submission` that the app runs in the
//! background.

use anyhow::Result;
use chrono::NaiveDate;
use uuid::Uuid;

use fintrack_core::forms::{BudgetForm, CategoryForm, ProfileForm, TransactionForm, ValidationErrors};
use fintrack_core::models::{
    Budget, BudgetPeriod, BudgetUpdate, Category, CategoryUpdate, NewBudget, NewCategory,
    NewTransaction, Transaction, TransactionType, TransactionUpdate, UserUpdate,
};
use fintrack_core::{ApiClient, Mutation};

use crate::app::is_valid_input_char;

/// Earliest and latest year offered by the budget year picker
const MIN_PICKER_YEAR: i32 = 2000;
const MAX_PICKER_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Kind,
    Description,
    Amount,
    Category,
    Date,
    Notes,
    Name,
    Color,
    Icon,
    Month,
    Year,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Kind => "Type",
            Field::Description => "Description",
            Field::Amount => "Amount",
            Field::Category => "Category",
            Field::Date => "Date",
            Field::Notes => "Notes",
            Field::Name => "Name",
            Field::Color => "Color",
            Field::Icon => "Icon",
            Field::Month => "Month",
            Field::Year => "Year",
        }
    }

    /// Name used by `ValidationErrors`
    pub fn error_key(&self) -> &'static str {
        match self {
            Field::Kind => "type",
            Field::Description => "description",
            Field::Amount => "amount",
            Field::Category => "category_id",
            Field::Date => "date",
            Field::Notes => "notes",
            Field::Name => "name",
            Field::Color => "color",
            Field::Icon => "icon",
            Field::Month => "month",
            Field::Year => "year",
        }
    }

    /// Picked with ←/→ instead of typed
    pub fn is_choice(&self) -> bool {
        matches!(self, Field::Kind | Field::Category | Field::Month | Field::Year)
    }

    /// Maximum characters accepted while typing
    fn max_len(&self) -> usize {
        match self {
            Field::Description => 200,
            Field::Amount => 16,
            Field::Date => 10,
            Field::Notes => 500,
            Field::Name => 100,
            Field::Color => 7,
            Field::Icon => 30,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogForm {
    Transaction(TransactionForm),
    Category(CategoryForm),
    Budget(BudgetForm),
    Profile(ProfileForm),
}

/// A validated write, ready to send
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    CreateTransaction(NewTransaction),
    UpdateTransaction(Uuid, TransactionUpdate),
    DeleteTransaction(Uuid),
    CreateCategory(NewCategory),
    UpdateCategory(Uuid, CategoryUpdate),
    DeleteCategory(Uuid),
    CreateBudget(NewBudget),
    UpdateBudget(Uuid, BudgetUpdate),
    DeleteBudget(Uuid),
    UpdateProfile(UserUpdate),
}

impl Submission {
    pub fn mutation(&self) -> Mutation {
        match self {
            Submission::CreateTransaction(_) => Mutation::CreateTransaction,
            Submission::UpdateTransaction(..) => Mutation::UpdateTransaction,
            Submission::DeleteTransaction(_) => Mutation::DeleteTransaction,
            Submission::CreateCategory(_) => Mutation::CreateCategory,
            Submission::UpdateCategory(..) => Mutation::UpdateCategory,
            Submission::DeleteCategory(_) => Mutation::DeleteCategory,
            Submission::CreateBudget(_) => Mutation::CreateBudget,
            Submission::UpdateBudget(..) => Mutation::UpdateBudget,
            Submission::DeleteBudget(_) => Mutation::DeleteBudget,
            Submission::UpdateProfile(_) => Mutation::UpdateProfile,
        }
    }

    pub async fn execute(self, api: &ApiClient) -> Result<()> {
        match self {
            Submission::CreateTransaction(body) => api.create_transaction(&body).await.map(drop),
            Submission::UpdateTransaction(id, body) => {
                api.update_transaction(id, &body).await.map(drop)
            }
            Submission::DeleteTransaction(id) => api.delete_transaction(id).await,
            Submission::CreateCategory(body) => api.create_category(&body).await.map(drop),
            Submission::UpdateCategory(id, body) => api.update_category(id, &body).await.map(drop),
            Submission::DeleteCategory(id) => api.delete_category(id).await,
            Submission::CreateBudget(body) => api.create_budget(&body).await.map(drop),
            Submission::UpdateBudget(id, body) => api.update_budget(id, &body).await.map(drop),
            Submission::DeleteBudget(id) => api.delete_budget(id).await,
            Submission::UpdateProfile(body) => api.update_current_user(&body).await.map(drop),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormDialog {
    /// Assigned when opened; matches mutation results to the form that sent them
    pub id: u64,
    pub form: DialogForm,
    /// Record being edited; `None` creates a new one
    pub editing: Option<Uuid>,
    pub focus: usize,
    pub errors: ValidationErrors,
    /// Message from the server after a failed submit
    pub api_error: Option<String>,
    pub submitting: bool,
}

impl FormDialog {
    fn with_form(form: DialogForm, editing: Option<Uuid>) -> Self {
        Self {
            id: 0,
            form,
            editing,
            focus: 0,
            errors: ValidationErrors::default(),
            api_error: None,
            submitting: false,
        }
    }

    pub fn new_transaction(kind: TransactionType, today: NaiveDate) -> Self {
        let mut dialog = Self::with_form(DialogForm::Transaction(TransactionForm::new(kind, today)), None);
        // type is preselected, start on the description
        dialog.focus = 1;
        dialog
    }

    pub fn edit_transaction(t: &Transaction) -> Self {
        Self::with_form(
            DialogForm::Transaction(TransactionForm::from_transaction(t)),
            Some(t.id),
        )
    }

    pub fn new_category() -> Self {
        Self::with_form(DialogForm::Category(CategoryForm::default()), None)
    }

    pub fn edit_category(c: &Category) -> Self {
        Self::with_form(DialogForm::Category(CategoryForm::from_category(c)), Some(c.id))
    }

    pub fn new_budget(period: BudgetPeriod, categories: &[Category]) -> Self {
        let mut form = BudgetForm::new(period);
        form.category_id = categories.first().map(|c| c.id);
        Self::with_form(DialogForm::Budget(form), None)
    }

    pub fn edit_budget(b: &Budget) -> Self {
        Self::with_form(DialogForm::Budget(BudgetForm::from_budget(b)), Some(b.id))
    }

    pub fn edit_profile(name: &str) -> Self {
        Self::with_form(
            DialogForm::Profile(ProfileForm {
                name: name.to_string(),
            }),
            None,
        )
    }

    pub fn title(&self) -> String {
        let verb = if self.editing.is_some() { "Edit" } else { "New" };
        match &self.form {
            DialogForm::Transaction(f) => match f.kind {
                TransactionType::Income => format!("{} Income", verb),
                TransactionType::Expense => format!("{} Expense", verb),
            },
            DialogForm::Category(_) => format!("{} Category", verb),
            DialogForm::Budget(_) => format!("{} Budget", verb),
            DialogForm::Profile(_) => "Edit Profile".to_string(),
        }
    }

    /// Visible fields in display order
    pub fn fields(&self) -> Vec<Field> {
        match &self.form {
            DialogForm::Transaction(f) => {
                let mut fields = vec![Field::Kind, Field::Description, Field::Amount];
                if f.uses_category() {
                    fields.push(Field::Category);
                }
                fields.extend([Field::Date, Field::Notes]);
                fields
            }
            DialogForm::Category(_) => vec![Field::Name, Field::Color, Field::Icon],
            // only the amount of an existing budget can change
            DialogForm::Budget(_) if self.editing.is_some() => vec![Field::Amount],
            DialogForm::Budget(_) => vec![Field::Category, Field::Amount, Field::Month, Field::Year],
            DialogForm::Profile(_) => vec![Field::Name],
        }
    }

    pub fn focused_field(&self) -> Option<Field> {
        self.fields().get(self.focus).copied()
    }

    pub fn next_field(&mut self) {
        let count = self.fields().len();
        if count > 0 {
            self.focus = (self.focus + 1) % count;
        }
    }

    pub fn prev_field(&mut self) {
        let count = self.fields().len();
        if count > 0 {
            self.focus = (self.focus + count - 1) % count;
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match (&mut self.form, field) {
            (DialogForm::Transaction(f), Field::Description) => Some(&mut f.description),
            (DialogForm::Transaction(f), Field::Amount) => Some(&mut f.amount),
            (DialogForm::Transaction(f), Field::Date) => Some(&mut f.date),
            (DialogForm::Transaction(f), Field::Notes) => Some(&mut f.notes),
            (DialogForm::Category(f), Field::Name) => Some(&mut f.name),
            (DialogForm::Category(f), Field::Color) => Some(&mut f.color),
            (DialogForm::Category(f), Field::Icon) => Some(&mut f.icon),
            (DialogForm::Budget(f), Field::Amount) => Some(&mut f.amount),
            (DialogForm::Profile(f), Field::Name) => Some(&mut f.name),
            _ => None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if self.submitting {
            return;
        }
        let Some(field) = self.focused_field() else {
            return;
        };
        if let Some(text) = self.text_mut(field) {
            if can_add_field_char(text.chars().count(), c, field.max_len()) {
                text.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if self.submitting {
            return;
        }
        if let Some(field) = self.focused_field() {
            if let Some(text) = self.text_mut(field) {
                text.pop();
            }
        }
    }

    /// Step a choice field forward or backward
    pub fn cycle_choice(&mut self, forward: bool, categories: &[Category]) {
        if self.submitting {
            return;
        }
        let Some(field) = self.focused_field() else {
            return;
        };
        match (&mut self.form, field) {
            (DialogForm::Transaction(f), Field::Kind) => {
                f.kind = f.kind.toggle();
            }
            (DialogForm::Transaction(f), Field::Category) => {
                f.category_id = cycle_category(f.category_id, categories, forward, true);
            }
            (DialogForm::Budget(f), Field::Category) => {
                f.category_id = cycle_category(f.category_id, categories, forward, false);
            }
            (DialogForm::Budget(f), Field::Month) => {
                f.month = if forward {
                    f.month % 12 + 1
                } else {
                    (f.month + 10) % 12 + 1
                };
            }
            (DialogForm::Budget(f), Field::Year) => {
                let step = if forward { 1 } else { -1 };
                f.year = (f.year + step).clamp(MIN_PICKER_YEAR, MAX_PICKER_YEAR);
            }
            _ => {}
        }
        // toggling the type can hide the focused field
        let count = self.fields().len();
        if self.focus >= count {
            self.focus = count.saturating_sub(1);
        }
    }

    /// Text shown for a field
    pub fn display_value(&self, field: Field, categories: &[Category]) -> String {
        match (&self.form, field) {
            (DialogForm::Transaction(f), Field::Kind) => match f.kind {
                TransactionType::Income => "Income".to_string(),
                TransactionType::Expense => "Expense".to_string(),
            },
            (DialogForm::Transaction(f), Field::Category) => {
                category_label(categories, f.category_id, "Uncategorized")
            }
            (DialogForm::Budget(f), Field::Category) => {
                category_label(categories, f.category_id, "Select a category")
            }
            (DialogForm::Budget(f), Field::Month) => BudgetPeriod { year: f.year, month: f.month }
                .month_name()
                .to_string(),
            (DialogForm::Budget(f), Field::Year) => f.year.to_string(),
            (DialogForm::Transaction(f), Field::Description) => f.description.clone(),
            (DialogForm::Transaction(f), Field::Amount) => f.amount.clone(),
            (DialogForm::Transaction(f), Field::Date) => f.date.clone(),
            (DialogForm::Transaction(f), Field::Notes) => f.notes.clone(),
            (DialogForm::Category(f), Field::Name) => f.name.clone(),
            (DialogForm::Category(f), Field::Color) => f.color.clone(),
            (DialogForm::Category(f), Field::Icon) => f.icon.clone(),
            (DialogForm::Budget(f), Field::Amount) => f.amount.clone(),
            (DialogForm::Profile(f), Field::Name) => f.name.clone(),
            _ => String::new(),
        }
    }

    pub fn field_error(&self, field: Field) -> Option<&str> {
        self.errors.get(field.error_key())
    }

    /// Validate and build the write. Errors are kept for display.
    pub fn submit(&mut self) -> Option<Submission> {
        if self.submitting {
            return None;
        }
        self.api_error = None;
        match self.build_submission() {
            Ok(submission) => {
                self.errors = ValidationErrors::default();
                Some(submission)
            }
            Err(errors) => {
                self.errors = errors;
                None
            }
        }
    }

    fn build_submission(&self) -> Result<Submission, ValidationErrors> {
        let submission = match (&self.form, self.editing) {
            (DialogForm::Transaction(f), None) => Submission::CreateTransaction(f.validate()?),
            (DialogForm::Transaction(f), Some(id)) => {
                Submission::UpdateTransaction(id, f.validate_update()?)
            }
            (DialogForm::Category(f), None) => Submission::CreateCategory(f.validate()?),
            (DialogForm::Category(f), Some(id)) => {
                Submission::UpdateCategory(id, f.validate()?.into())
            }
            (DialogForm::Budget(f), None) => Submission::CreateBudget(f.validate()?),
            (DialogForm::Budget(f), Some(id)) => Submission::UpdateBudget(
                id,
                BudgetUpdate {
                    amount: Some(f.validate()?.amount),
                },
            ),
            (DialogForm::Profile(f), _) => Submission::UpdateProfile(f.validate()?),
        };
        Ok(submission)
    }
}

/// Label for an optional category id
fn category_label(categories: &[Category], id: Option<Uuid>, none: &str) -> String {
    id.and_then(|id| categories.iter().find(|c| c.id == id))
        .map(|c| c.name.clone())
        .unwrap_or_else(|| none.to_string())
}

/// Next category id in list order. With `allow_none` the cycle includes "no category".
fn cycle_category(
    current: Option<Uuid>,
    categories: &[Category],
    forward: bool,
    allow_none: bool,
) -> Option<Uuid> {
    let mut options: Vec<Option<Uuid>> = Vec::with_capacity(categories.len() + 1);
    if allow_none {
        options.push(None);
    }
    options.extend(categories.iter().map(|c| Some(c.id)));
    if options.is_empty() {
        return current;
    }

    let len = options.len();
    let next = match options.iter().position(|o| *o == current) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None if forward => 0,
        None => len - 1,
    };
    options[next]
}

/// Check if a character should be accepted into a form field
pub fn can_add_field_char(current_len: usize, c: char, max_len: usize) -> bool {
    current_len < max_len && is_valid_input_char(c)
}

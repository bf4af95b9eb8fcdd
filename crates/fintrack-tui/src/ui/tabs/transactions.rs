use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use fintrack_core::models::{category_name, Category, Transaction, TransactionType};
use fintrack_core::utils::{format_currency, format_date, truncate_string};

use crate::app::{App, TxColumn};
use crate::ui::styles;
use crate::ui::tabs::{placeholder, render_message};

const EMPTY_INCOME: &str = "No income recorded";
const EMPTY_EXPENSES: &str = "No expenses recorded";

/// Render the Transactions tab - income and expenses side by side
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_column(frame, app, chunks[0], TransactionType::Income);
    render_column(frame, app, chunks[1], TransactionType::Expense);
}

fn render_column(frame: &mut Frame, app: &App, area: Rect, kind: TransactionType) {
    let (column, list, selection, empty, label) = match kind {
        TransactionType::Income => (
            TxColumn::Income,
            app.income_transactions(),
            app.income_selection,
            EMPTY_INCOME,
            "Income",
        ),
        TransactionType::Expense => (
            TxColumn::Expense,
            app.expense_transactions(),
            app.expense_selection,
            EMPTY_EXPENSES,
            "Expenses",
        ),
    };
    let focused = app.tx_column == column;

    let query = app.cache.transactions();
    // the other column may have rows while this one has none
    let placeholder_line = placeholder(Some(query), empty).or_else(|| {
        list.is_empty()
            .then(|| Line::from(Span::styled(empty, styles::muted_style())))
    });
    if let Some(message) = placeholder_line {
        render_message(frame, area, label, message);
        return;
    }

    let symbol = app.config.currency_symbol.as_str();
    let categories = app.categories();
    let totals = app.transaction_totals();
    let total = match kind {
        TransactionType::Income => totals.total_income,
        TransactionType::Expense => totals.total_expense,
    };

    let header_cells = match kind {
        TransactionType::Income => vec!["Date", "Description", "Amount"],
        TransactionType::Expense => vec!["Date", "Description", "Category", "Amount"],
    };
    let header = Row::new(header_cells.into_iter().map(Cell::from))
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = list
        .iter()
        .enumerate()
        .map(|(i, t)| transaction_row(t, kind, categories, symbol, focused && i == selection))
        .collect();

    let widths: Vec<Constraint> = match kind {
        TransactionType::Income => vec![
            Constraint::Length(13),
            Constraint::Fill(1),
            Constraint::Length(14),
        ],
        TransactionType::Expense => vec![
            Constraint::Length(13),
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(14),
        ],
    };

    let title = format!(
        " {} ({}) - {} ",
        label,
        list.len(),
        format_currency(total, symbol)
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused {
        state.select(Some(selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn transaction_row<'a>(
    t: &Transaction,
    kind: TransactionType,
    categories: &[Category],
    symbol: &str,
    selected: bool,
) -> Row<'a> {
    let style = if selected {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };

    let mut cells = vec![
        Cell::from(format_date(&t.date)),
        Cell::from(truncate_string(&t.description, 36)),
    ];
    if kind == TransactionType::Expense {
        let category = category_name(categories, t.category_id, "Uncategorized").to_string();
        cells.push(Cell::from(Span::styled(category, styles::muted_style())));
    }
    cells.push(Cell::from(Span::styled(
        format!("{:>13}", format_currency(t.amount, symbol)),
        styles::amount_style(kind),
    )));

    Row::new(cells).style(style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintrack_core::{ApiClient, Config, QueryData};
    use ratatui::{backend::TestBackend, Terminal};

    fn test_app(dir: &tempfile::TempDir) -> App {
        let api = ApiClient::new("http://127.0.0.1:9/api/v1").expect("client");
        App::with_parts(
            Config::default(),
            dir.path().join("config.json"),
            dir.path().to_path_buf(),
            api,
        )
    }

    fn expense(n: u128) -> Transaction {
        serde_json::from_value(serde_json::json!({
            "id": uuid::Uuid::from_u128(n),
            "description": format!("groceries {}", n),
            "amount": "12.50",
            "type": "expense",
            "category_id": null,
            "user_id": uuid::Uuid::from_u128(99),
            "date": "2025-03-10T00:00:00",
            "created_at": "2025-03-10T00:00:00"
        }))
        .expect("valid transaction json")
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).expect("terminal");
        terminal
            .draw(|frame| render(frame, app, frame.area()))
            .expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_empty_income_column_beside_expenses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.cache
            .resolve(QueryData::Transactions(vec![expense(1), expense(2)]));

        let text = screen(&app);
        assert!(text.contains(EMPTY_INCOME));
        assert!(!text.contains(EMPTY_EXPENSES));
        assert!(text.contains("groceries 1"));
        assert!(text.contains("Expenses (2) - $25.00"));
    }

    #[test]
    fn test_both_columns_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.cache.resolve(QueryData::Transactions(Vec::new()));

        let text = screen(&app);
        assert!(text.contains(EMPTY_INCOME));
        assert!(text.contains(EMPTY_EXPENSES));
    }
}

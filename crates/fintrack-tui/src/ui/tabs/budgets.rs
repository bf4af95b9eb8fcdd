use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use fintrack_core::models::{category_color, category_name, Budget, Category};
use fintrack_core::utils::{format_currency, format_percent};

use crate::app::App;
use crate::ui::styles;
use crate::ui::tabs::{placeholder, render_message, scroll_offset};

const EMPTY_BUDGETS: &str = "No budgets found. Press [n] to create one.";

/// Rows per budget card, borders included
const CARD_HEIGHT: u16 = 5;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("Budgets - {}", app.budget_period.label());
    if let Some(message) = placeholder(app.cache.budgets(app.budget_period), EMPTY_BUDGETS) {
        render_message(frame, area, &title, message);
        return;
    }

    let budgets = app.budgets();
    let visible = (area.height / CARD_HEIGHT).max(1) as usize;
    let offset = scroll_offset(app.budget_selection, visible);

    let shown: Vec<(usize, &Budget)> = budgets
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .collect();

    let mut constraints = vec![Constraint::Length(CARD_HEIGHT); shown.len()];
    constraints.push(Constraint::Min(0));
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let categories = app.categories();
    let symbol = app.config.currency_symbol.as_str();
    for ((index, budget), slot) in shown.into_iter().zip(slots.iter()) {
        render_card(frame, *slot, budget, categories, symbol, index == app.budget_selection);
    }
}

fn render_card(
    frame: &mut Frame,
    area: Rect,
    budget: &Budget,
    categories: &[Category],
    symbol: &str,
    selected: bool,
) {
    let name = category_name(categories, Some(budget.category_id), "Category");
    let color = category_color(categories, budget.category_id);

    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled("■ ", styles::swatch_style(color)),
        Span::styled(name.to_string(), styles::list_item_style()),
        Span::raw(" "),
    ]);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(styles::border_style(selected));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let percentage = budget.percentage_used();
    let spent_line = Line::from(vec![
        Span::styled(
            format_currency(budget.spent(), symbol),
            styles::list_item_style(),
        ),
        Span::styled(
            format!(" of {}", format_currency(budget.amount, symbol)),
            styles::muted_style(),
        ),
    ]);
    frame.render_widget(Paragraph::new(spent_line), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(styles::budget_gauge_style(percentage))
        .ratio(budget.progress() / 100.0)
        .label(format_percent(percentage));
    frame.render_widget(gauge, rows[1]);

    frame.render_widget(Paragraph::new(remaining_line(budget, symbol)), rows[2]);
}

fn remaining_line(budget: &Budget, symbol: &str) -> Line<'static> {
    if budget.is_exceeded() {
        Line::from(Span::styled(
            format!("Exceeded by {}", format_currency(budget.overage(), symbol)),
            styles::expense_style(),
        ))
    } else {
        Line::from(Span::styled(
            format!("Remaining: {}", format_currency(budget.remaining(), symbol)),
            styles::income_style(),
        ))
    }
}

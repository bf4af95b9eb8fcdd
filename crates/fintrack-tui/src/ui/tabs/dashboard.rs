use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use fintrack_core::models::{category_name, MonthlyTotals};
use fintrack_core::utils::{format_currency, format_date, format_signed, truncate_string};

use crate::app::App;
use crate::ui::styles;
use crate::ui::tabs::{placeholder, render_message};

const EMPTY_RECENT: &str = "No transactions found";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),      // Summary cards
            Constraint::Percentage(55), // Monthly chart
            Constraint::Min(5),         // Recent transactions
        ])
        .split(area);

    render_summary_cards(frame, app, chunks[0]);
    render_monthly_chart(frame, app, chunks[1]);
    render_recent_transactions(frame, app, chunks[2]);
}

fn render_summary_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let summary = app.summary();
    let symbol = app.config.currency_symbol.as_str();

    let values = [
        (
            "Balance",
            format_currency(summary.balance, symbol),
            styles::balance_style(summary.balance < Decimal::ZERO),
        ),
        (
            "Income",
            format_currency(summary.total_income, symbol),
            styles::income_style(),
        ),
        (
            "Expenses",
            format_currency(summary.total_expense, symbol),
            styles::expense_style(),
        ),
        (
            "Transactions",
            summary.transaction_count.to_string(),
            styles::list_item_style(),
        ),
    ];

    for ((title, value, style), card) in values.into_iter().zip(cards.iter()) {
        let block = Block::default()
            .title(format!(" {} ", title))
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        let paragraph = Paragraph::new(Line::from(Span::styled(value, style)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, *card);
    }
}

/// Whole currency units for a bar height
fn bar_value(amount: Decimal) -> u64 {
    amount.round().to_u64().unwrap_or(0)
}

fn month_group(month: &MonthlyTotals) -> BarGroup<'static> {
    BarGroup::default()
        .label(Line::from(month.name.clone()))
        .bars(&[
            Bar::default()
                .value(bar_value(month.income))
                .text_value(String::new())
                .style(styles::income_style()),
            Bar::default()
                .value(bar_value(month.expense))
                .text_value(String::new())
                .style(styles::expense_style()),
        ])
}

fn render_monthly_chart(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Monthly overview {} ", app.chart_year);
    let months = app.monthly();

    if months.is_empty() {
        let message = placeholder(app.cache.monthly(app.chart_year), "No data for this year")
            .unwrap_or_default();
        render_message(frame, area, title.trim(), message);
        return;
    }

    let block = Block::default()
        .title(Line::from(vec![
            Span::styled(title, styles::muted_style()),
            Span::styled("■ income ", styles::income_style()),
            Span::styled("■ expenses ", styles::expense_style()),
        ]))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    // Two bars per month plus a gap, sized to the available width
    let inner_width = area.width.saturating_sub(2);
    let per_group = inner_width / months.len().max(1) as u16;
    let bar_width = (per_group.saturating_sub(2) / 2).clamp(1, 6);

    let mut chart = BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(0)
        .group_gap(2)
        .label_style(styles::muted_style());
    for month in months {
        chart = chart.data(month_group(month));
    }

    frame.render_widget(chart, area);
}

fn render_recent_transactions(frame: &mut Frame, app: &App, area: Rect) {
    let title = " Recent transactions ";
    if let Some(message) = placeholder(Some(app.cache.recent_transactions()), EMPTY_RECENT) {
        render_message(frame, area, title.trim(), message);
        return;
    }

    let symbol = app.config.currency_symbol.as_str();
    let categories = app.categories();
    let rows: Vec<Row> = app
        .recent_transactions()
        .iter()
        .map(|t| {
            let category = if t.is_income() {
                ""
            } else {
                category_name(categories, t.category_id, "Uncategorized")
            };
            Row::new(vec![
                Cell::from(format_date(&t.date)),
                Cell::from(truncate_string(&t.description, 40)),
                Cell::from(Span::styled(category.to_string(), styles::muted_style())),
                Cell::from(Span::styled(
                    format!("{:>14}", format_signed(t.signed_amount(), symbol)),
                    styles::amount_style(t.kind),
                )),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(13),
        Constraint::Fill(3),
        Constraint::Fill(1),
        Constraint::Length(15),
    ];

    let table = Table::new(rows, widths).block(
        Block::default()
            .title(title)
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(table, area);
}

//! Per-tab content rendering.

pub mod budgets;
pub mod categories;
pub mod dashboard;
pub mod transactions;

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use fintrack_core::Query;

use crate::ui::styles;

pub const LOADING_TEXT: &str = "Loading...";

/// What to show instead of rows: loading, the fetch error, or the empty text.
/// `None` when the query has rows to render.
pub fn placeholder<T>(query: Option<&Query<Vec<T>>>, empty_text: &str) -> Option<Line<'static>> {
    let Some(query) = query else {
        return Some(Line::from(Span::styled(LOADING_TEXT, styles::muted_style())));
    };
    match query.data() {
        Some(rows) if !rows.is_empty() => None,
        Some(_) => Some(Line::from(Span::styled(empty_text.to_string(), styles::muted_style()))),
        None if query.is_loading() => {
            Some(Line::from(Span::styled(LOADING_TEXT, styles::muted_style())))
        }
        None => match query.error() {
            Some(error) => Some(Line::from(Span::styled(
                format!("Failed to load: {}", error),
                styles::error_style(),
            ))),
            None => Some(Line::from(Span::styled(LOADING_TEXT, styles::muted_style()))),
        },
    }
}

/// A bordered box holding a single centered message
pub fn render_message(frame: &mut Frame, area: Rect, title: &str, message: Line<'static>) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let paragraph = Paragraph::new(vec![Line::from(""), message])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

/// First row to draw so that `selected` stays inside `visible` rows
pub fn scroll_offset(selected: usize, visible: usize) -> usize {
    if visible == 0 {
        return selected;
    }
    selected.saturating_sub(visible - 1)
}

use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::ui::tabs::{placeholder, render_message};

const EMPTY_CATEGORIES: &str = "No categories found. Press [n] to create one.";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(message) = placeholder(Some(app.cache.categories()), EMPTY_CATEGORIES) {
        render_message(frame, area, "Categories", message);
        return;
    }

    let categories = app.categories();

    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Name"),
        Cell::from("Icon"),
        Cell::from("Color"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let style = if i == app.category_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(Span::styled("██", styles::swatch_style(&category.color))),
                Cell::from(category.name.clone()),
                Cell::from(Span::styled(category.icon.clone(), styles::muted_style())),
                Cell::from(Span::styled(category.color.clone(), styles::muted_style())),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Fill(3),
        Constraint::Fill(1),
        Constraint::Length(9),
    ];

    let title = format!(" Categories ({}) - [n]ew [Enter] edit [d]elete ", categories.len());

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.category_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

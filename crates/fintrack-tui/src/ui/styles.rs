use ratatui::style::{Color, Modifier, Style};

use fintrack_core::models::{parse_hex_color, TransactionType, DEFAULT_CATEGORY_COLOR};

// Color palette
pub const PRIMARY: Color = Color::Rgb(99, 102, 241);
pub const INCOME: Color = Color::Rgb(34, 197, 94);
pub const EXPENSE: Color = Color::Rgb(239, 68, 68);
pub const ACCENT: Color = Color::Rgb(234, 179, 8);
pub const ERROR: Color = Color::Rgb(220, 38, 38);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn income_style() -> Style {
    Style::default().fg(INCOME)
}

pub fn expense_style() -> Style {
    Style::default().fg(EXPENSE)
}

pub fn amount_style(kind: TransactionType) -> Style {
    match kind {
        TransactionType::Income => income_style(),
        TransactionType::Expense => expense_style(),
    }
}

/// Green when non-negative, red otherwise
pub fn balance_style(negative: bool) -> Style {
    let style = if negative { expense_style() } else { income_style() };
    style.add_modifier(Modifier::BOLD)
}

/// Terminal color for a `#RRGGBB` category color
pub fn category_color(hex: &str) -> Color {
    parse_hex_color(hex)
        .or_else(|| parse_hex_color(DEFAULT_CATEGORY_COLOR))
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(PRIMARY)
}

pub fn swatch_style(hex: &str) -> Style {
    Style::default().fg(category_color(hex))
}

/// Gauge color by percentage used
pub fn budget_gauge_style(percentage: f64) -> Style {
    let color = if percentage > 100.0 {
        EXPENSE
    } else if percentage >= 80.0 {
        ACCENT
    } else {
        INCOME
    };
    Style::default().fg(color).bg(HIGHLIGHT)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn input_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

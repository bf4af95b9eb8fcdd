use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, LoginMode, Tab};
use crate::dialog::FormDialog;

use super::styles;
use super::tabs::{budgets, categories, dashboard, transactions};

/// Width of text inputs in overlays
const INPUT_WIDTH: usize = 28;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::EditingForm => {
            if let Some(ref dialog) = app.dialog {
                render_form_overlay(frame, app, dialog);
            }
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  fintrack";
    let help_hint = "[?] Help";
    let user = app
        .user_label()
        .map(|u| format!("{}  ", u))
        .unwrap_or_default();

    let used = title.chars().count() + user.chars().count() + help_hint.len() + 4;
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(user, styles::list_item_style()),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    // Month picker on the right of the budgets tab
    if app.current_tab == Tab::Budgets {
        let period = format!("[ {} ]", app.budget_period.label());
        let main_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let padding = (area.width as usize).saturating_sub(main_width + period.chars().count() + 2);
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(period, styles::highlight_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Dashboard => dashboard::render(frame, app, area),
        Tab::Transactions => transactions::render(frame, app, area),
        Tab::Categories => categories::render(frame, app, area),
        Tab::Budgets => budgets::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.current_tab {
        Tab::Dashboard => "[i]ncome [e]xpense | [u]pdate | [q]uit",
        Tab::Transactions => "[i]/[e] new [Enter] edit [d]elete | [u]pdate | [q]uit",
        Tab::Categories | Tab::Budgets => "[n]ew [Enter] edit [d]elete | [u]pdate | [q]uit",
    };

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if app.is_busy() {
        " Loading... ".to_string()
    } else if let Some(age) = app.last_updated() {
        format!(" Updated {} ", age)
    } else {
        String::new()
    };

    let right_text = format!(" {} ", shortcuts);
    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 27, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(
            format!(" fintrack {}", version),
            styles::title_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-4", "Switch tabs"),
        help_line("←/→", "Prev/next tab"),
        help_line("↑/↓", "Navigate list"),
        help_line("Tab", "Switch income/expense column"),
        help_line("[ / ]", "Previous/next budget month"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("i / e", "New income / expense"),
        help_line("n", "New category or budget"),
        help_line("Enter", "Edit selected"),
        help_line("d", "Delete selected"),
        help_line("p", "Edit profile"),
        help_line("u", "Refresh all data"),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Forms", styles::highlight_style())),
        help_line("Tab/↑/↓", "Move between fields"),
        help_line("←/→", "Change a choice"),
        help_line("Enter", "Save"),
        help_line("Esc", "Cancel"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// `Label: [value▌]` row of a form
fn input_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let shown: String = {
        let count = value.chars().count();
        // keep the end of long values visible
        value.chars().skip(count.saturating_sub(INPUT_WIDTH)).collect()
    };
    let cursor = if focused { "▌" } else { "" };
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    Line::from(vec![
        Span::styled(format!("  {:>11}: [", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = INPUT_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    if focused {
        Line::from(vec![
            Span::raw("              ["),
            Span::styled(format!(" ▶ {} ◀ ", label), styles::selected_style()),
            Span::raw("]"),
        ])
    } else {
        Line::from(vec![
            Span::raw("              ["),
            Span::styled(format!("   {}   ", label), styles::list_item_style()),
            Span::raw("]"),
        ])
    }
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let registering = app.login_mode == LoginMode::Register;
    let mut height = if registering { 13 } else { 12 };
    if app.login_error.is_some() {
        height += 2;
    }
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let title = if registering { " Create account " } else { " Log in " };
    let mut lines = vec![Line::from("")];

    lines.push(input_line("Email", &app.login_email, app.login_focus == LoginFocus::Email));
    if registering {
        lines.push(input_line("Name", &app.login_name, app.login_focus == LoginFocus::Name));
    }
    let masked = "*".repeat(app.login_password.chars().count());
    lines.push(input_line("Password", &masked, app.login_focus == LoginFocus::Password));
    lines.push(Line::from(""));

    let button = match (app.login_pending, registering) {
        (true, _) => "Please wait...",
        (false, true) => "Register",
        (false, false) => "Login",
    };
    lines.push(button_line(button, app.login_focus == LoginFocus::Button));
    lines.push(Line::from(""));

    let switch = if registering {
        "Already have an account? Log in"
    } else {
        "No account? Register"
    };
    let switch_style = if app.login_focus == LoginFocus::ModeSwitch {
        styles::selected_style()
    } else {
        styles::muted_style()
    };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(switch, switch_style),
        Span::styled("  (Ctrl+R)", styles::muted_style()),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_form_overlay(frame: &mut Frame, app: &App, dialog: &FormDialog) {
    let categories = app.categories();
    let fields = dialog.fields();
    let focused = dialog.focused_field();

    let mut lines = vec![Line::from("")];
    for field in &fields {
        let is_focused = focused == Some(*field);
        let value = dialog.display_value(*field, categories);
        if field.is_choice() {
            let style = styles::input_style(is_focused);
            lines.push(Line::from(vec![
                Span::styled(format!("  {:>11}: ", field.label()), styles::muted_style()),
                Span::styled(format!("◀ {} ▶", value), style),
            ]));
        } else {
            lines.push(input_line(field.label(), &value, is_focused));
        }
        if let Some(error) = dialog.field_error(*field) {
            lines.push(Line::from(Span::styled(
                format!("               {}", error),
                styles::error_style(),
            )));
        }
    }

    lines.push(Line::from(""));
    let button = if dialog.submitting { "Saving..." } else { "Save" };
    lines.push(button_line(button, !dialog.submitting));

    if let Some(ref error) = dialog.api_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [Enter]", styles::help_key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    let height = (lines.len() as u16 + 2).max(8);
    let area = centered_rect_fixed(56, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(format!(" {} ", dialog.title()), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(50, 8, frame.area());
    frame.render_widget(Clear, area);

    let label = app
        .pending_delete
        .as_ref()
        .map(|p| p.label.clone())
        .unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   Delete {}?", label), styles::highlight_style())),
        Line::from(Span::styled("   This cannot be undone.", styles::muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style())
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        let r = centered_rect_fixed(50, 10, outer);
        assert_eq!(r, Rect::new(25, 15, 50, 10));
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let outer = Rect::new(0, 0, 30, 5);
        let r = centered_rect_fixed(50, 10, outer);
        assert_eq!(r.width, 30);
        assert_eq!(r.height, 5);
    }
}

//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use fintrack_core::models::TransactionType;

use crate::app::{App, AppState, LoginFocus, Tab, TxColumn, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return Ok(handle_login_input(app, key)),
        AppState::EditingForm => {
            handle_form_input(app, key);
            return Ok(false);
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('u') => {
            app.refresh_all();
            return Ok(false);
        }
        KeyCode::Char('L') => {
            app.logout();
            return Ok(false);
        }
        KeyCode::Char('p') => {
            app.open_profile_dialog();
            return Ok(false);
        }
        KeyCode::Char('1') => app.set_tab(Tab::Dashboard),
        KeyCode::Char('2') => app.set_tab(Tab::Transactions),
        KeyCode::Char('3') => app.set_tab(Tab::Categories),
        KeyCode::Char('4') => app.set_tab(Tab::Budgets),
        KeyCode::Left => app.set_tab(app.current_tab.prev()),
        KeyCode::Right => app.set_tab(app.current_tab.next()),
        KeyCode::Char('i') => app.open_new_transaction(TransactionType::Income),
        KeyCode::Char('e') => app.open_new_transaction(TransactionType::Expense),
        _ => handle_tab_input(app, key),
    }

    // Any key clears a stale status message
    if app.state == AppState::Normal && !matches!(key.code, KeyCode::Char('u')) {
        app.status_message = None;
    }
    Ok(false)
}

fn handle_tab_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        KeyCode::Enter => app.open_edit_dialog(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('n') => app.open_new_dialog(),
        KeyCode::Tab | KeyCode::BackTab if app.current_tab == Tab::Transactions => {
            app.toggle_tx_column();
        }
        KeyCode::Char('[') if app.current_tab == Tab::Budgets => app.prev_budget_period(),
        KeyCode::Char(']') if app.current_tab == Tab::Budgets => app.next_budget_period(),
        _ => {}
    }
}

/// Login overlay keys. Returns true to quit.
fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('r') {
            app.toggle_login_mode();
        }
        return false;
    }

    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Down | KeyCode::Tab => app.next_login_focus(),
        KeyCode::Up | KeyCode::BackTab => app.prev_login_focus(),
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Button => app.attempt_login(),
            LoginFocus::ModeSwitch => app.toggle_login_mode(),
            // Enter on the last input submits
            LoginFocus::Password => app.attempt_login(),
            LoginFocus::Email | LoginFocus::Name => app.next_login_focus(),
        },
        KeyCode::Backspace => app.login_backspace(),
        KeyCode::Char(c) => app.login_insert_char(c),
        _ => {}
    }
    false
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.close_dialog();
        return;
    }
    if key.code == KeyCode::Enter {
        app.submit_dialog();
        return;
    }

    let categories = app.categories().to_vec();
    let Some(dialog) = app.dialog.as_mut() else {
        app.state = AppState::Normal;
        return;
    };
    let on_choice = dialog.focused_field().is_some_and(|f| f.is_choice());

    match key.code {
        KeyCode::Tab | KeyCode::Down => dialog.next_field(),
        KeyCode::BackTab | KeyCode::Up => dialog.prev_field(),
        KeyCode::Left if on_choice => dialog.cycle_choice(false, &categories),
        KeyCode::Right | KeyCode::Char(' ') if on_choice => dialog.cycle_choice(true, &categories),
        KeyCode::Backspace => dialog.backspace(),
        KeyCode::Char(c) if !on_choice => dialog.insert_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintrack_core::{ApiClient, Config};

    fn test_app(dir: &tempfile::TempDir) -> App {
        let api = ApiClient::new("http://127.0.0.1:9/api/v1").expect("client");
        App::with_parts(
            Config::default(),
            dir.path().join("config.json"),
            dir.path().to_path_buf(),
            api,
        )
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE)).expect("input")
    }

    #[test]
    fn test_number_keys_switch_tabs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.current_tab, Tab::Budgets);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.current_tab, Tab::Dashboard);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.current_tab, Tab::Budgets);
    }

    #[test]
    fn test_quit_requires_confirmation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!press(&mut app, KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Normal);
        press(&mut app, KeyCode::Char('q'));
        assert!(press(&mut app, KeyCode::Char('y')));
    }

    #[test]
    fn test_expense_form_typing_and_escape() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::EditingForm);

        // letters go into the form, not to global shortcuts
        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.state, AppState::EditingForm);
        let dialog = app.dialog.as_ref().expect("dialog");
        assert_eq!(
            dialog.display_value(crate::dialog::Field::Description, &[]),
            "qu"
        );

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
        assert!(app.dialog.is_none());
    }

    #[test]
    fn test_tab_toggles_transaction_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.tx_column, TxColumn::Expense);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tx_column, TxColumn::Income);
    }

    #[test]
    fn test_brackets_change_budget_month() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        let start = app.budget_period;
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.budget_period, start, "only on the budgets tab");

        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.budget_period, start.next());
        press(&mut app, KeyCode::Char('['));
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.budget_period, start.prev());
    }

    #[test]
    fn test_login_overlay_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.login_email.clear();
        app.start_login();
        assert_eq!(app.login_focus, LoginFocus::Email);

        for c in "ana@example.com".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.login_email, "ana@example.com");

        handle_input(&mut app, KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL))
            .expect("input");
        assert_eq!(app.login_mode, crate::app::LoginMode::Register);
        assert_eq!(app.login_email, "ana@example.com");

        assert!(press(&mut app, KeyCode::Esc));
    }

    #[test]
    fn test_help_overlay_toggles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state, AppState::ShowingHelp);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
    }
}

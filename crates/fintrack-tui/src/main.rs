//! fintrack - a terminal client for a personal finance backend.
//!
//! Keyboard-driven views of income, expenses, categories and monthly budgets,
//! plus a few one-shot commands for scripting.

mod app;
mod dialog;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Datelike;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fintrack_core::config::{ENV_PASSWORD, LOG_FILE};
use fintrack_core::utils::{format_currency, format_signed};
use fintrack_core::{ApiClient, CacheManager, Config, Session, SessionData};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const USAGE: &str = "Usage: fintrack [--login | --logout | --summary [YEAR] | --help]";

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a file so output never lands on the alternate screen.
/// The guard must live until exit to flush buffered lines.
fn init_file_tracing() -> Option<WorkerGuard> {
    let dir = Config::app_dir().ok()?;
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Warning: cannot create log directory {}: {}", dir.display(), e);
        return None;
    }
    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Some(guard)
}

/// One-shot commands log to stderr
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(command) = args.first() {
        init_stderr_tracing();
        return match command.as_str() {
            "--login" => login_command().await,
            "--logout" => logout_command(),
            "--summary" => summary_command(args.get(1).map(String::as_str)).await,
            "--help" | "-h" => {
                println!("{}", USAGE);
                Ok(())
            }
            other => Err(anyhow::anyhow!("Unknown argument: {}\n{}", other, USAGE)),
        };
    }

    let _guard = init_file_tracing();
    info!("fintrack starting");

    // Create app before touching the terminal so config errors print normally
    let mut app = App::new()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if app.is_authenticated() {
        app.resume_session();
    } else {
        app.start_login();
    }

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("fintrack shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();
        app.tick();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// One-shot commands
// ============================================================================

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(email) => print!("Email [{}]: ", email),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        default
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Email is required"))
    } else {
        Ok(input.to_string())
    }
}

/// `--login`: prompt for credentials and save a session
async fn login_command() -> Result<()> {
    let mut config = Config::load().unwrap_or_default();
    let api = ApiClient::new(&config.api_base_url())?;

    println!("\n=== fintrack login ({}) ===\n", api.base_url());
    let email = prompt_email(config.prefill_email().as_deref())?;
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(p) if !p.is_empty() => p,
        _ => rpassword::prompt_password("Password: ")?,
    };

    let token = api
        .login(&email, &password)
        .await
        .context("Login failed")?;

    let mut session = Session::new(Config::app_dir()?);
    session.update(SessionData::from_token(token, &email));
    session.save()?;

    config.last_email = Some(email.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}", email);
    Ok(())
}

/// `--logout`: forget the session and this account's snapshots
fn logout_command() -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let mut session = Session::new(Config::app_dir()?);
    if let Err(e) = session.load() {
        warn!(error = %e, "Ignoring unreadable session");
    }

    if let Some(email) = session.email().map(str::to_string) {
        CacheManager::new(config.cache_dir(&email)?)?.clear()?;
    }
    session.clear()?;

    println!("Logged out");
    Ok(())
}

/// `--summary [YEAR]`: print totals and the monthly breakdown
async fn summary_command(year: Option<&str>) -> Result<()> {
    let year = match year {
        Some(y) => y
            .parse::<i32>()
            .with_context(|| format!("Invalid year: {}", y))?,
        None => chrono::Local::now().year(),
    };

    let config = Config::load().unwrap_or_default();
    let mut session = Session::new(Config::app_dir()?);
    session.load()?;
    let token = session
        .token()
        .ok_or_else(|| anyhow::anyhow!("No saved session. Run `fintrack --login` first."))?
        .to_string();

    let api = ApiClient::new(&config.api_base_url())?.with_token(token);
    let (summary, months) = futures::try_join!(
        api.transaction_summary(None, None),
        api.monthly_totals(Some(year)),
    )?;

    let symbol = config.currency_symbol.as_str();
    println!("Balance:       {:>16}", format_currency(summary.balance, symbol));
    println!("Income:        {:>16}", format_currency(summary.total_income, symbol));
    println!("Expenses:      {:>16}", format_currency(summary.total_expense, symbol));
    println!("Transactions:  {:>16}", summary.transaction_count);
    println!();
    println!("{:<6} {:>16} {:>16} {:>16}", year, "Income", "Expenses", "Net");
    for month in &months {
        println!(
            "{:<6} {:>16} {:>16} {:>16}",
            month.name,
            format_currency(month.income, symbol),
            format_currency(month.expense, symbol),
            format_signed(month.net(), symbol),
        );
    }
    Ok(())
}

//! Application state management for fintrack.
//!
//! This module contains the core `App` struct that owns the session, the query
//! cache and all UI state. Fetches and mutations run as spawned tasks and
//! report back through an mpsc channel that the main loop drains every frame.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Datelike;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use fintrack_core::config::{sanitize_path_component, ENV_PASSWORD};
use fintrack_core::forms::{LoginForm, RegisterForm};
use fintrack_core::models::{
    category_name, partition_by_type, AuthToken, Budget, BudgetPeriod, Category, MonthlyTotals,
    NewUser, Transaction, TransactionSummary, TransactionType,
};
use fintrack_core::{
    ApiClient, ApiError, CacheManager, Config, Mutation, QueryCache, QueryData, QueryKey, Session,
    SessionData,
};

use crate::dialog::{FormDialog, Submission};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for name input
const MAX_NAME_LENGTH: usize = 100;

/// Maximum length for password input
const MAX_PASSWORD_LENGTH: usize = 100;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// How often visible queries are checked for staleness
const REFRESH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Transactions,
    Categories,
    Budgets,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Dashboard, Tab::Transactions, Tab::Categories, Tab::Budgets];

    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Transactions => "Transactions",
            Tab::Categories => "Categories",
            Tab::Budgets => "Budgets",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Transactions,
            Tab::Transactions => Tab::Categories,
            Tab::Categories => Tab::Budgets,
            Tab::Budgets => Tab::Dashboard,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Budgets,
            Tab::Transactions => Tab::Dashboard,
            Tab::Categories => Tab::Transactions,
            Tab::Budgets => Tab::Categories,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Dashboard => 0,
            Tab::Transactions => 1,
            Tab::Categories => 2,
            Tab::Budgets => 3,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    EditingForm,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Login,
    Register,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Name,
    Password,
    Button,
    ModeSwitch,
}

/// Column of the transactions tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxColumn {
    Income,
    Expense,
}

/// Delete waiting for confirmation
#[derive(Debug, Clone)]
pub struct PendingDelete {
    /// What is being deleted, e.g. `category "Food"`
    pub label: String,
    pub submission: Submission,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Result types from background tasks.
#[derive(Debug)]
enum TaskResult {
    Fetched(QueryData),
    FetchFailed {
        key: QueryKey,
        error: String,
        unauthorized: bool,
    },
    /// `dialog` is the id of the form that submitted, `None` for deletes
    Mutated {
        mutation: Mutation,
        dialog: Option<u64>,
    },
    MutationFailed {
        error: String,
        unauthorized: bool,
        dialog: Option<u64>,
    },
    LoggedIn {
        email: String,
        token: AuthToken,
    },
    LoginFailed(String),
}

/// A task result tagged with the session it was started in.
/// Results from before a logout are dropped.
#[derive(Debug)]
struct TaskMessage {
    epoch: u64,
    result: TaskResult,
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    config_path: PathBuf,
    data_dir: PathBuf,
    pub session: Session,
    pub api: ApiClient,
    pub cache: QueryCache,
    snapshots: Option<CacheManager>,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub tx_column: TxColumn,
    pub budget_period: BudgetPeriod,
    pub chart_year: i32,

    // Selection indices
    pub income_selection: usize,
    pub expense_selection: usize,
    pub category_selection: usize,
    pub budget_selection: usize,

    // Login form state
    pub login_mode: LoginMode,
    pub login_email: String,
    pub login_name: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_pending: bool,

    // Dialogs
    pub dialog: Option<FormDialog>,
    next_dialog_id: u64,
    pub pending_delete: Option<PendingDelete>,

    // Background task channel
    task_tx: mpsc::Sender<TaskMessage>,
    task_rx: mpsc::Receiver<TaskMessage>,
    epoch: u64,
    last_refresh_check: Instant,

    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance from the user's config and cache directories
    pub fn new() -> Result<Self> {
        let config_path = Config::default_path()?;
        let config = match Config::load_from(&config_path) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        let data_dir = Config::app_dir().unwrap_or_else(|_| PathBuf::from("./.fintrack"));
        debug!(?data_dir, api_url = %config.api_base_url(), "Config loaded");

        let api = ApiClient::new(&config.api_base_url())?;
        Ok(Self::with_parts(config, config_path, data_dir, api))
    }

    /// Build an app around explicit paths and client
    pub fn with_parts(config: Config, config_path: PathBuf, data_dir: PathBuf, mut api: ApiClient) -> Self {
        let mut session = Session::new(data_dir.clone());
        match session.load() {
            Ok(true) => debug!("Session loaded"),
            Ok(false) => debug!("No valid session found"),
            Err(e) => warn!(error = %e, "Failed to load session"),
        }

        if let Some(token) = session.token() {
            api.set_token(token.to_string());
        }

        let session_email = session.email().map(str::to_string);

        // An expired session is a logout: drop its file and that account's snapshots
        if !session.is_valid() {
            if let Some(ref email) = session_email {
                info!(%email, "Saved session expired");
                discard_snapshots(&data_dir, email);
                if let Err(e) = session.clear() {
                    warn!(error = %e, "Failed to clear expired session");
                }
            }
        }

        let login_email = session_email
            .or_else(|| config.prefill_email())
            .unwrap_or_default();
        let login_password = std::env::var(ENV_PASSWORD).unwrap_or_default();

        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let today = chrono::Local::now().date_naive();

        Self {
            config,
            config_path,
            data_dir,
            session,
            api,
            cache: QueryCache::new(),
            snapshots: None,

            state: AppState::Normal,
            current_tab: Tab::Dashboard,
            tx_column: TxColumn::Expense,
            budget_period: BudgetPeriod::from_date(today),
            chart_year: today.year(),

            income_selection: 0,
            expense_selection: 0,
            category_selection: 0,
            budget_selection: 0,

            login_mode: LoginMode::Login,
            login_email,
            login_name: String::new(),
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,
            login_pending: false,

            dialog: None,
            next_dialog_id: 1,
            pending_delete: None,

            task_tx,
            task_rx,
            epoch: 0,
            last_refresh_check: Instant::now(),

            status_message: None,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    /// Pick up a saved session: show snapshots, then refetch. A rejected token logs out.
    pub fn resume_session(&mut self) {
        let Some(email) = self.session.email().map(str::to_string) else {
            self.start_login();
            return;
        };
        info!(%email, "Resuming saved session");
        self.open_snapshots(&email);
        self.refresh_active_queries();
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_pending = false;
    }

    pub fn toggle_login_mode(&mut self) {
        self.login_mode = match self.login_mode {
            LoginMode::Login => LoginMode::Register,
            LoginMode::Register => LoginMode::Login,
        };
        self.login_error = None;
        self.login_focus = LoginFocus::Email;
    }

    /// Focus order of the login overlay
    pub fn login_fields(&self) -> &'static [LoginFocus] {
        match self.login_mode {
            LoginMode::Login => &[
                LoginFocus::Email,
                LoginFocus::Password,
                LoginFocus::Button,
                LoginFocus::ModeSwitch,
            ],
            LoginMode::Register => &[
                LoginFocus::Email,
                LoginFocus::Name,
                LoginFocus::Password,
                LoginFocus::Button,
                LoginFocus::ModeSwitch,
            ],
        }
    }

    pub fn next_login_focus(&mut self) {
        let fields = self.login_fields();
        let i = fields.iter().position(|f| *f == self.login_focus).unwrap_or(0);
        self.login_focus = fields[(i + 1) % fields.len()];
    }

    pub fn prev_login_focus(&mut self) {
        let fields = self.login_fields();
        let i = fields.iter().position(|f| *f == self.login_focus).unwrap_or(0);
        self.login_focus = fields[(i + fields.len() - 1) % fields.len()];
    }

    pub fn login_insert_char(&mut self, c: char) {
        if self.login_pending {
            return;
        }
        match self.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(self.login_email.chars().count(), c) {
                    self.login_email.push(c);
                }
            }
            LoginFocus::Name => {
                if can_add_name_char(self.login_name.chars().count(), c) {
                    self.login_name.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(self.login_password.chars().count(), c) {
                    self.login_password.push(c);
                }
            }
            LoginFocus::Button | LoginFocus::ModeSwitch => {}
        }
    }

    pub fn login_backspace(&mut self) {
        if self.login_pending {
            return;
        }
        match self.login_focus {
            LoginFocus::Email => {
                self.login_email.pop();
            }
            LoginFocus::Name => {
                self.login_name.pop();
            }
            LoginFocus::Password => {
                self.login_password.pop();
            }
            LoginFocus::Button | LoginFocus::ModeSwitch => {}
        }
    }

    /// Validate the login overlay and start a login (or register + login) task
    pub fn attempt_login(&mut self) {
        if self.login_pending {
            return;
        }

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.epoch;

        match self.login_mode {
            LoginMode::Login => {
                let form = LoginForm {
                    email: self.login_email.clone(),
                    password: self.login_password.clone(),
                };
                let (email, password) = match form.validate() {
                    Ok(v) => v,
                    Err(errors) => {
                        self.login_error = Some(errors.to_string());
                        return;
                    }
                };
                info!(%email, "Logging in");
                tokio::spawn(async move {
                    let result = match api.login(&email, &password).await {
                        Ok(token) => TaskResult::LoggedIn { email, token },
                        Err(e) => {
                            error!(error = %e, "Login failed");
                            TaskResult::LoginFailed(login_error_message(&e))
                        }
                    };
                    send_result(&tx, epoch, result).await;
                });
            }
            LoginMode::Register => {
                let form = RegisterForm {
                    email: self.login_email.clone(),
                    name: self.login_name.clone(),
                    password: self.login_password.clone(),
                };
                let new_user = match form.validate() {
                    Ok(v) => v,
                    Err(errors) => {
                        self.login_error = Some(errors.to_string());
                        return;
                    }
                };
                info!(email = %new_user.email, "Registering account");
                tokio::spawn(async move {
                    let result = match register_and_login(&api, &new_user).await {
                        Ok(token) => TaskResult::LoggedIn {
                            email: new_user.email,
                            token,
                        },
                        Err(e) => {
                            error!(error = %e, "Registration failed");
                            TaskResult::LoginFailed(error_message(&e))
                        }
                    };
                    send_result(&tx, epoch, result).await;
                });
            }
        }

        self.login_error = None;
        self.login_pending = true;
    }

    /// Store the new session and load this account's data
    fn on_login(&mut self, email: String, token: AuthToken) {
        self.epoch += 1;
        self.cache.clear();

        self.api.set_token(token.access_token.clone());
        self.session.update(SessionData::from_token(token, &email));
        if let Err(e) = self.session.save() {
            warn!(error = %e, "Failed to save session");
        }

        self.config.last_email = Some(email.clone());
        if let Err(e) = self.config.save_to(&self.config_path) {
            warn!(error = %e, "Failed to save config");
        }

        self.open_snapshots(&email);

        self.login_password.clear();
        self.login_name.clear();
        self.login_error = None;
        self.login_pending = false;
        self.login_mode = LoginMode::Login;
        self.state = AppState::Normal;
        self.status_message = Some(format!("Logged in as {}", email));
        info!(%email, "Login successful");

        self.refresh_active_queries();
    }

    /// Attach the snapshot directory for `email` and show what it holds
    fn open_snapshots(&mut self, email: &str) {
        let dir = self.data_dir.join(sanitize_path_component(email));
        match CacheManager::new(dir) {
            Ok(manager) => {
                let today = chrono::Local::now().date_naive();
                let keys = [
                    QueryKey::CurrentUser,
                    QueryKey::Categories,
                    QueryKey::Transactions,
                    QueryKey::RecentTransactions,
                    QueryKey::TransactionSummary,
                    QueryKey::MonthlyData { year: today.year() },
                    QueryKey::Budgets(BudgetPeriod::from_date(today)),
                ];
                for snapshot in manager.load_snapshots(&keys) {
                    self.cache.hydrate(snapshot);
                }
                self.snapshots = Some(manager);
            }
            Err(e) => {
                warn!(error = %e, "Snapshot cache unavailable");
                self.snapshots = None;
            }
        }
    }

    /// Drop the session, snapshots and cached data, and show the login overlay
    pub fn logout(&mut self) {
        info!("Logging out");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        if let Some(snapshots) = self.snapshots.take() {
            if let Err(e) = snapshots.clear() {
                warn!(error = %e, "Failed to clear snapshots");
            }
        }
        self.cache.clear();
        self.api.clear_token();
        self.epoch += 1;

        self.dialog = None;
        self.pending_delete = None;
        self.income_selection = 0;
        self.expense_selection = 0;
        self.category_selection = 0;
        self.budget_selection = 0;
        self.login_password.clear();
        self.login_error = None;
        self.status_message = None;
        self.start_login();
    }

    /// The server rejected our token
    fn expire_session(&mut self) {
        warn!("Session rejected by server");
        self.logout();
        self.login_error = Some("Session expired. Please log in again.".to_string());
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Queries a tab renders
    pub fn keys_for_tab(&self, tab: Tab) -> Vec<QueryKey> {
        let mut keys = vec![QueryKey::CurrentUser, QueryKey::Categories];
        match tab {
            Tab::Dashboard => keys.extend([
                QueryKey::TransactionSummary,
                QueryKey::MonthlyData { year: self.chart_year },
                QueryKey::RecentTransactions,
            ]),
            Tab::Transactions => keys.push(QueryKey::Transactions),
            Tab::Categories => {}
            Tab::Budgets => keys.push(QueryKey::Budgets(self.budget_period)),
        }
        keys
    }

    /// Fetch every visible query that is missing, invalidated or stale
    pub fn refresh_active_queries(&mut self) {
        self.last_refresh_check = Instant::now();
        if !self.session.is_valid() {
            return;
        }
        for key in self.cache.pending(&self.keys_for_tab(self.current_tab)) {
            self.spawn_fetch(key);
        }
    }

    fn spawn_fetch(&mut self, key: QueryKey) {
        debug!(%key, "Fetching");
        self.cache.begin_fetch(&key);

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.epoch;

        tokio::spawn(async move {
            let result = match api.fetch_query(&key).await {
                Ok(data) => TaskResult::Fetched(data),
                Err(e) => {
                    error!(%key, error = %e, "Fetch failed");
                    TaskResult::FetchFailed {
                        key,
                        error: error_message(&e),
                        unauthorized: ApiError::is_unauthorized(&e),
                    }
                }
            };
            send_result(&tx, epoch, result).await;
        });
    }

    /// Invalidate everything and refetch what is visible
    pub fn refresh_all(&mut self) {
        info!("Refreshing all data");
        self.cache.invalidate_all();
        self.refresh_active_queries();
        self.status_message = Some("Refreshing...".to_string());
    }

    /// Periodic work from the main loop
    pub fn tick(&mut self) {
        if self.last_refresh_check.elapsed() >= REFRESH_CHECK_INTERVAL {
            self.refresh_active_queries();
        }
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut messages = Vec::new();
        while let Ok(message) = self.task_rx.try_recv() {
            messages.push(message);
        }
        for message in messages {
            self.process_message(message);
        }
    }

    fn process_message(&mut self, message: TaskMessage) {
        if message.epoch != self.epoch {
            debug!(result = ?message.result, "Dropping result from previous session");
            return;
        }

        match message.result {
            TaskResult::Fetched(data) => {
                let key = data.key();
                if let Some(ref snapshots) = self.snapshots {
                    if let Err(e) = snapshots.save_query(&data) {
                        warn!(error = %e, "Failed to save snapshot");
                    }
                }
                self.cache.resolve(data);
                self.clamp_selections();

                // a write landed while this request was out
                if self.cache.needs_fetch(&key) && self.session.is_valid() {
                    debug!(%key, "Refetching after mid-flight invalidation");
                    self.spawn_fetch(key);
                }
            }
            TaskResult::FetchFailed {
                key,
                error,
                unauthorized,
            } => {
                if unauthorized {
                    self.expire_session();
                } else {
                    self.status_message = Some(format!("Failed to load {}: {}", key, error));
                    self.cache.reject(&key, error);
                }
            }
            TaskResult::Mutated { mutation, dialog } => {
                info!(?mutation, "Mutation succeeded");
                self.cache.apply(mutation);
                if self.dialog_matches(dialog) {
                    self.close_dialog();
                }
                self.status_message = Some(mutation.success_message().to_string());
                self.refresh_active_queries();
            }
            TaskResult::MutationFailed {
                error,
                unauthorized,
                dialog,
            } => {
                if unauthorized {
                    self.expire_session();
                } else if self.dialog_matches(dialog) {
                    if let Some(open) = self.dialog.as_mut() {
                        open.submitting = false;
                        open.api_error = Some(error);
                    }
                } else {
                    self.status_message = Some(error);
                }
            }
            TaskResult::LoggedIn { email, token } => self.on_login(email, token),
            TaskResult::LoginFailed(message) => {
                self.login_pending = false;
                self.login_error = Some(message);
            }
        }
    }

    /// Whether the open dialog is the one that sent a mutation
    fn dialog_matches(&self, origin: Option<u64>) -> bool {
        match (origin, self.dialog.as_ref()) {
            (Some(id), Some(open)) => open.id == id,
            _ => false,
        }
    }

    fn spawn_mutation(&mut self, submission: Submission, dialog: Option<u64>) {
        let mutation = submission.mutation();
        debug!(?mutation, ?dialog, "Submitting");

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.epoch;

        tokio::spawn(async move {
            let result = match submission.execute(&api).await {
                Ok(()) => TaskResult::Mutated { mutation, dialog },
                Err(e) => {
                    error!(?mutation, error = %e, "Mutation failed");
                    TaskResult::MutationFailed {
                        error: error_message(&e),
                        unauthorized: ApiError::is_unauthorized(&e),
                        dialog,
                    }
                }
            };
            send_result(&tx, epoch, result).await;
        });
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn set_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.refresh_active_queries();
    }

    pub fn next_budget_period(&mut self) {
        self.budget_period = self.budget_period.next();
        self.budget_selection = 0;
        self.refresh_active_queries();
    }

    pub fn prev_budget_period(&mut self) {
        self.budget_period = self.budget_period.prev();
        self.budget_selection = 0;
        self.refresh_active_queries();
    }

    pub fn toggle_tx_column(&mut self) {
        self.tx_column = match self.tx_column {
            TxColumn::Income => TxColumn::Expense,
            TxColumn::Expense => TxColumn::Income,
        };
    }

    fn current_list_len(&self) -> usize {
        match self.current_tab {
            Tab::Dashboard => 0,
            Tab::Transactions => match self.tx_column {
                TxColumn::Income => self.income_transactions().len(),
                TxColumn::Expense => self.expense_transactions().len(),
            },
            Tab::Categories => self.categories().len(),
            Tab::Budgets => self.budgets().len(),
        }
    }

    fn current_selection_mut(&mut self) -> Option<&mut usize> {
        match self.current_tab {
            Tab::Dashboard => None,
            Tab::Transactions => Some(match self.tx_column {
                TxColumn::Income => &mut self.income_selection,
                TxColumn::Expense => &mut self.expense_selection,
            }),
            Tab::Categories => Some(&mut self.category_selection),
            Tab::Budgets => Some(&mut self.budget_selection),
        }
    }

    /// Move the selection by `delta` rows, clamped to the list
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_list_len();
        if let Some(selection) = self.current_selection_mut() {
            if len == 0 {
                *selection = 0;
            } else {
                let target = *selection as isize + delta;
                *selection = target.clamp(0, len as isize - 1) as usize;
            }
        }
    }

    pub fn select_first(&mut self) {
        if let Some(selection) = self.current_selection_mut() {
            *selection = 0;
        }
    }

    pub fn select_last(&mut self) {
        let len = self.current_list_len();
        if let Some(selection) = self.current_selection_mut() {
            *selection = len.saturating_sub(1);
        }
    }

    /// Keep selections inside lists that shrank after a refetch
    fn clamp_selections(&mut self) {
        let income = self.income_transactions().len();
        let expense = self.expense_transactions().len();
        let categories = self.categories().len();
        let budgets = self.budgets().len();
        self.income_selection = self.income_selection.min(income.saturating_sub(1));
        self.expense_selection = self.expense_selection.min(expense.saturating_sub(1));
        self.category_selection = self.category_selection.min(categories.saturating_sub(1));
        self.budget_selection = self.budget_selection.min(budgets.saturating_sub(1));
    }

    // =========================================================================
    // Dialogs
    // =========================================================================

    pub fn open_new_transaction(&mut self, kind: TransactionType) {
        let today = chrono::Local::now().date_naive();
        self.open_dialog(FormDialog::new_transaction(kind, today));
    }

    /// `n` on tabs that create one kind of record
    pub fn open_new_dialog(&mut self) {
        match self.current_tab {
            Tab::Categories => self.open_dialog(FormDialog::new_category()),
            Tab::Budgets => {
                let dialog = FormDialog::new_budget(self.budget_period, self.categories());
                self.open_dialog(dialog);
            }
            Tab::Transactions => {
                let kind = match self.tx_column {
                    TxColumn::Income => TransactionType::Income,
                    TxColumn::Expense => TransactionType::Expense,
                };
                self.open_new_transaction(kind);
            }
            Tab::Dashboard => {}
        }
    }

    /// Edit the selected record
    pub fn open_edit_dialog(&mut self) {
        let dialog = match self.current_tab {
            Tab::Transactions => self.selected_transaction().map(FormDialog::edit_transaction),
            Tab::Categories => self.selected_category().map(FormDialog::edit_category),
            Tab::Budgets => self.selected_budget().map(FormDialog::edit_budget),
            Tab::Dashboard => None,
        };
        if let Some(dialog) = dialog {
            self.open_dialog(dialog);
        }
    }

    pub fn open_profile_dialog(&mut self) {
        if let Some(user) = self.cache.current_user().data() {
            let dialog = FormDialog::edit_profile(&user.name);
            self.open_dialog(dialog);
        }
    }

    fn open_dialog(&mut self, mut dialog: FormDialog) {
        dialog.id = self.next_dialog_id;
        self.next_dialog_id += 1;
        self.dialog = Some(dialog);
        self.state = AppState::EditingForm;
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
        self.state = AppState::Normal;
    }

    /// Validate the open dialog and send it
    pub fn submit_dialog(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if let Some(submission) = dialog.submit() {
            dialog.submitting = true;
            let origin = dialog.id;
            self.spawn_mutation(submission, Some(origin));
        }
    }

    /// Ask before deleting the selected record
    pub fn request_delete(&mut self) {
        let pending = match self.current_tab {
            Tab::Transactions => self.selected_transaction().map(|t| PendingDelete {
                label: format!("transaction \"{}\"", t.description),
                submission: Submission::DeleteTransaction(t.id),
            }),
            Tab::Categories => self.selected_category().map(|c| PendingDelete {
                label: format!("category \"{}\"", c.name),
                submission: Submission::DeleteCategory(c.id),
            }),
            Tab::Budgets => self.selected_budget().map(|b| PendingDelete {
                label: format!(
                    "budget for \"{}\"",
                    category_name(self.categories(), Some(b.category_id), "Category")
                ),
                submission: Submission::DeleteBudget(b.id),
            }),
            Tab::Dashboard => None,
        };
        if let Some(pending) = pending {
            self.pending_delete = Some(pending);
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        if let Some(pending) = self.pending_delete.take() {
            self.status_message = Some("Deleting...".to_string());
            self.spawn_mutation(pending.submission, None);
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    // =========================================================================
    // Data Accessors
    // =========================================================================

    pub fn categories(&self) -> &[Category] {
        self.cache.category_list()
    }

    /// Summary totals, zeros while loading
    pub fn summary(&self) -> TransactionSummary {
        self.cache
            .transaction_summary()
            .data()
            .cloned()
            .unwrap_or_default()
    }

    pub fn monthly(&self) -> &[MonthlyTotals] {
        self.cache
            .monthly(self.chart_year)
            .and_then(|q| q.data())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn recent_transactions(&self) -> &[Transaction] {
        self.cache
            .recent_transactions()
            .data()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn income_transactions(&self) -> Vec<&Transaction> {
        self.partitioned_transactions().0
    }

    pub fn expense_transactions(&self) -> Vec<&Transaction> {
        self.partitioned_transactions().1
    }

    /// Column totals over the loaded list, zeros while loading
    pub fn transaction_totals(&self) -> TransactionSummary {
        self.cache
            .transactions()
            .data()
            .map(|list| TransactionSummary::from_transactions(list))
            .unwrap_or_default()
    }

    /// (income, expense) in server order
    fn partitioned_transactions(&self) -> (Vec<&Transaction>, Vec<&Transaction>) {
        self.cache
            .transactions()
            .data()
            .map(|list| partition_by_type(list))
            .unwrap_or_default()
    }

    pub fn budgets(&self) -> &[Budget] {
        self.cache
            .budgets(self.budget_period)
            .and_then(|q| q.data())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        match self.tx_column {
            TxColumn::Income => self.income_transactions().get(self.income_selection).copied(),
            TxColumn::Expense => self.expense_transactions().get(self.expense_selection).copied(),
        }
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.categories().get(self.category_selection)
    }

    pub fn selected_budget(&self) -> Option<&Budget> {
        self.budgets().get(self.budget_selection)
    }

    /// Name for the status bar
    pub fn user_label(&self) -> Option<String> {
        self.cache
            .current_user()
            .data()
            .map(|u| u.name.clone())
            .or_else(|| self.session.email().map(str::to_string))
    }

    /// Age of the main query on the current tab
    pub fn last_updated(&self) -> Option<String> {
        match self.current_tab {
            Tab::Dashboard => self.cache.transaction_summary().age_display(),
            Tab::Transactions => self.cache.transactions().age_display(),
            Tab::Categories => self.cache.categories().age_display(),
            Tab::Budgets => self.cache.budgets(self.budget_period).and_then(|q| q.age_display()),
        }
    }

    /// Any request in flight
    pub fn is_busy(&self) -> bool {
        self.login_pending
            || self
                .keys_for_tab(self.current_tab)
                .iter()
                .any(|key| self.is_fetching(key))
    }

    fn is_fetching(&self, key: &QueryKey) -> bool {
        match key {
            QueryKey::CurrentUser => self.cache.current_user().is_fetching(),
            QueryKey::Categories => self.cache.categories().is_fetching(),
            QueryKey::Transactions => self.cache.transactions().is_fetching(),
            QueryKey::RecentTransactions => self.cache.recent_transactions().is_fetching(),
            QueryKey::TransactionSummary => self.cache.transaction_summary().is_fetching(),
            QueryKey::MonthlyData { year } => self.cache.monthly(*year).is_some_and(|q| q.is_fetching()),
            QueryKey::Budgets(period) => self.cache.budgets(*period).is_some_and(|q| q.is_fetching()),
        }
    }
}

// ============================================================================
// Task helpers
// ============================================================================

/// Helper to send task results, logging any channel errors
async fn send_result(tx: &mpsc::Sender<TaskMessage>, epoch: u64, result: TaskResult) {
    if let Err(e) = tx.send(TaskMessage { epoch, result }).await {
        error!(error = %e, "Failed to send task result - channel closed");
    }
}

async fn register_and_login(
    api: &ApiClient,
    new_user: &NewUser,
) -> Result<AuthToken> {
    let user = api.register(new_user).await?;
    info!(user_id = %user.id, "Account created");
    api.login(&new_user.email, &new_user.password).await
}

/// Remove the snapshot directory contents of an account that is no longer signed in
fn discard_snapshots(data_dir: &Path, email: &str) {
    let dir = data_dir.join(sanitize_path_component(email));
    if !dir.exists() {
        return;
    }
    match CacheManager::new(dir).and_then(|manager| manager.clear()) {
        Ok(()) => debug!(%email, "Removed snapshots"),
        Err(e) => warn!(%email, error = %e, "Failed to remove snapshots"),
    }
}

/// First `ApiError` in an error chain
fn find_api_error(err: &anyhow::Error) -> Option<&ApiError> {
    err.chain().find_map(|e| e.downcast_ref::<ApiError>())
}

/// Message shown to the user for a failed request
fn error_message(err: &anyhow::Error) -> String {
    match find_api_error(err) {
        Some(ApiError::NetworkError(_)) => {
            "Unable to connect to server. Check that the backend is running.".to_string()
        }
        Some(api_error) => api_error.to_string(),
        None => format!("{:#}", err),
    }
}

fn login_error_message(err: &anyhow::Error) -> String {
    if ApiError::is_unauthorized(err) {
        "Invalid email or password".to_string()
    } else {
        error_message(err)
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
pub fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_name_char(current_len: usize, c: char) -> bool {
    current_len < MAX_NAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_app(dir: &tempfile::TempDir) -> App {
        let api = ApiClient::new("http://127.0.0.1:9/api/v1").expect("client");
        App::with_parts(
            Config::default(),
            dir.path().join("config.json"),
            dir.path().to_path_buf(),
            api,
        )
    }

    fn token() -> AuthToken {
        AuthToken {
            access_token: "tok".to_string(),
            token_type: "bearer".to_string(),
        }
    }

    fn category(n: u128, name: &str) -> Category {
        serde_json::from_value(serde_json::json!({
            "id": Uuid::from_u128(n),
            "name": name,
            "color": "#ef4444",
            "icon": "tag",
            "user_id": Uuid::from_u128(99),
            "created_at": "2025-01-01T00:00:00"
        }))
        .expect("valid category json")
    }

    fn transaction(n: u128, kind: &str) -> Transaction {
        serde_json::from_value(serde_json::json!({
            "id": Uuid::from_u128(n),
            "description": format!("txn {}", n),
            "amount": "10.00",
            "type": kind,
            "category_id": null,
            "user_id": Uuid::from_u128(99),
            "date": "2025-03-10T00:00:00",
            "created_at": "2025-03-10T00:00:00"
        }))
        .expect("valid transaction json")
    }

    fn message(app: &App, result: TaskResult) -> TaskMessage {
        TaskMessage {
            epoch: app.epoch,
            result,
        }
    }

    #[test]
    fn test_tab_next() {
        assert_eq!(Tab::Dashboard.next(), Tab::Transactions);
        assert_eq!(Tab::Transactions.next(), Tab::Categories);
        assert_eq!(Tab::Categories.next(), Tab::Budgets);
        assert_eq!(Tab::Budgets.next(), Tab::Dashboard);
    }

    #[test]
    fn test_tab_prev() {
        assert_eq!(Tab::Dashboard.prev(), Tab::Budgets);
        assert_eq!(Tab::Budgets.prev(), Tab::Categories);
        for tab in Tab::ALL {
            assert_eq!(tab.next().prev(), tab);
        }
    }

    #[test]
    fn test_keys_for_tab() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test_app(&dir);

        let budgets = app.keys_for_tab(Tab::Budgets);
        assert!(budgets.contains(&QueryKey::Budgets(app.budget_period)));
        assert!(budgets.contains(&QueryKey::Categories));

        let dashboard = app.keys_for_tab(Tab::Dashboard);
        assert!(dashboard.contains(&QueryKey::RecentTransactions));
        assert!(dashboard.contains(&QueryKey::MonthlyData { year: app.chart_year }));
        assert!(!dashboard.contains(&QueryKey::Transactions));
    }

    #[test]
    fn test_fetched_data_resolves_and_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.open_snapshots("ana@example.com");

        let msg = message(&app, TaskResult::Fetched(QueryData::Categories(vec![category(1, "Food")])));
        app.process_message(msg);

        assert_eq!(app.categories().len(), 1);
        assert!(dir
            .path()
            .join("ana_example.com")
            .join("categories.json")
            .exists());
    }

    #[test]
    fn test_results_from_previous_session_are_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        let stale = TaskMessage {
            epoch: app.epoch,
            result: TaskResult::Fetched(QueryData::Categories(vec![category(1, "Food")])),
        };
        app.logout();
        app.process_message(stale);
        assert!(app.categories().is_empty());
    }

    #[test]
    fn test_unauthorized_fetch_logs_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.session
            .update(SessionData::from_token(token(), "ana@example.com"));
        app.session.save().expect("save");
        app.cache
            .resolve(QueryData::Categories(vec![category(1, "Food")]));
        let epoch = app.epoch;

        let msg = message(
            &app,
            TaskResult::FetchFailed {
                key: QueryKey::CurrentUser,
                error: "Unauthorized".to_string(),
                unauthorized: true,
            },
        );
        app.process_message(msg);

        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.session.is_valid());
        assert!(!dir.path().join("session.json").exists());
        assert!(app.categories().is_empty());
        assert!(app.epoch > epoch);
        assert!(app.login_error.is_some());
    }

    #[test]
    fn test_network_failure_keeps_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.session
            .update(SessionData::from_token(token(), "ana@example.com"));

        let msg = message(
            &app,
            TaskResult::FetchFailed {
                key: QueryKey::Categories,
                error: "Unable to connect".to_string(),
                unauthorized: false,
            },
        );
        app.process_message(msg);

        assert!(app.session.is_valid());
        assert_eq!(app.cache.categories().error(), Some("Unable to connect"));
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_mutation_success_closes_dialog_and_invalidates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.cache
            .resolve(QueryData::Transactions(vec![transaction(1, "income")]));
        app.open_dialog(FormDialog::new_category());
        let origin = app.dialog.as_ref().map(|d| d.id);

        let msg = message(
            &app,
            TaskResult::Mutated {
                mutation: Mutation::CreateTransaction,
                dialog: origin,
            },
        );
        app.process_message(msg);

        assert!(app.dialog.is_none());
        assert_eq!(app.state, AppState::Normal);
        assert!(app.cache.transactions().is_invalidated());
        assert_eq!(app.status_message.as_deref(), Some("Transaction created"));
        // data stays visible until the refetch lands
        assert_eq!(app.income_transactions().len(), 1);
    }

    #[test]
    fn test_mutation_failure_shows_error_in_dialog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        let mut dialog = FormDialog::new_category();
        dialog.submitting = true;
        app.open_dialog(dialog);
        let origin = app.dialog.as_ref().map(|d| d.id);

        let msg = message(
            &app,
            TaskResult::MutationFailed {
                error: "Category already exists".to_string(),
                unauthorized: false,
                dialog: origin,
            },
        );
        app.process_message(msg);

        let dialog = app.dialog.as_ref().expect("dialog stays open");
        assert!(!dialog.submitting);
        assert_eq!(dialog.api_error.as_deref(), Some("Category already exists"));
        assert_eq!(app.state, AppState::EditingForm);
    }

    #[test]
    fn test_delete_result_leaves_unrelated_form_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.open_dialog(FormDialog::new_category());
        if let Some(dialog) = app.dialog.as_mut() {
            dialog.insert_char('F');
        }

        let msg = message(
            &app,
            TaskResult::Mutated {
                mutation: Mutation::DeleteTransaction,
                dialog: None,
            },
        );
        app.process_message(msg);

        assert_eq!(app.state, AppState::EditingForm);
        let dialog = app.dialog.as_ref().expect("form stays open");
        assert_eq!(dialog.display_value(crate::dialog::Field::Name, &[]), "F");
        assert_eq!(app.status_message.as_deref(), Some("Transaction deleted"));

        let msg = message(
            &app,
            TaskResult::MutationFailed {
                error: "Transaction not found".to_string(),
                unauthorized: false,
                dialog: None,
            },
        );
        app.process_message(msg);

        let dialog = app.dialog.as_ref().expect("form stays open");
        assert!(dialog.api_error.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Transaction not found"));
    }

    #[test]
    fn test_result_for_closed_dialog_does_not_touch_new_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.open_dialog(FormDialog::new_category());
        let first = app.dialog.as_ref().map(|d| d.id);
        app.close_dialog();
        app.open_dialog(FormDialog::new_category());
        assert_ne!(app.dialog.as_ref().map(|d| d.id), first);

        let msg = message(
            &app,
            TaskResult::Mutated {
                mutation: Mutation::CreateCategory,
                dialog: first,
            },
        );
        app.process_message(msg);
        assert!(app.dialog.is_some());
        assert_eq!(app.state, AppState::EditingForm);
    }

    #[test]
    fn test_expired_session_discards_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut old = Session::new(dir.path().to_path_buf());
        old.update(SessionData {
            access_token: "tok".to_string(),
            token_type: "bearer".to_string(),
            email: "ana@example.com".to_string(),
            created_at: chrono::Utc::now() - chrono::Duration::hours(30),
        });
        old.save().expect("save");
        let snapshots = CacheManager::new(dir.path().join("ana_example.com")).expect("cache");
        snapshots
            .save_query(&QueryData::Categories(vec![category(1, "Food")]))
            .expect("snapshot");
        let snapshot_file = dir.path().join("ana_example.com").join("categories.json");
        assert!(snapshot_file.exists());

        let app = test_app(&dir);

        assert!(!app.is_authenticated());
        assert!(!snapshot_file.exists());
        assert!(!dir.path().join("session.json").exists());
        assert_eq!(app.login_email, "ana@example.com");
    }

    #[test]
    fn test_login_failed_sets_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.login_pending = true;
        let msg = message(&app, TaskResult::LoginFailed("Invalid email or password".to_string()));
        app.process_message(msg);
        assert!(!app.login_pending);
        assert_eq!(app.login_error.as_deref(), Some("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_logged_in_saves_session_and_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.start_login();
        app.login_password = "secret123".to_string();

        let msg = message(
            &app,
            TaskResult::LoggedIn {
                email: "ana@example.com".to_string(),
                token: token(),
            },
        );
        app.process_message(msg);

        assert_eq!(app.state, AppState::Normal);
        assert!(app.api.has_token());
        assert!(app.login_password.is_empty());
        assert!(dir.path().join("session.json").exists());
        let config = Config::load_from(&dir.path().join("config.json")).expect("config");
        assert_eq!(config.last_email.as_deref(), Some("ana@example.com"));
        // visible queries were requested
        assert!(app.cache.current_user().is_fetching());
    }

    #[test]
    fn test_invalid_login_form_does_not_spawn() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.login_email.clear();
        app.login_password.clear();
        app.attempt_login();
        assert!(!app.login_pending);
        assert!(app.login_error.is_some());
    }

    #[test]
    fn test_login_focus_cycles_by_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.login_focus = LoginFocus::Email;
        app.next_login_focus();
        assert_eq!(app.login_focus, LoginFocus::Password);

        app.toggle_login_mode();
        assert_eq!(app.login_mode, LoginMode::Register);
        app.next_login_focus();
        assert_eq!(app.login_focus, LoginFocus::Name);
        app.prev_login_focus();
        app.prev_login_focus();
        assert_eq!(app.login_focus, LoginFocus::ModeSwitch);
    }

    #[test]
    fn test_selection_clamps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.cache.resolve(QueryData::Categories(vec![
            category(1, "A"),
            category(2, "B"),
            category(3, "C"),
        ]));
        app.current_tab = Tab::Categories;

        app.move_selection(PAGE_SCROLL_SIZE as isize);
        assert_eq!(app.category_selection, 2);
        app.move_selection(-1);
        assert_eq!(app.category_selection, 1);
        app.select_first();
        assert_eq!(app.category_selection, 0);
        app.select_last();
        assert_eq!(app.selected_category().map(|c| c.name.as_str()), Some("C"));

        let msg = message(&app, TaskResult::Fetched(QueryData::Categories(vec![category(1, "A")])));
        app.process_message(msg);
        assert_eq!(app.category_selection, 0);
    }

    #[test]
    fn test_request_delete_needs_confirmation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.current_tab = Tab::Categories;

        app.request_delete();
        assert_eq!(app.state, AppState::Normal);

        app.cache
            .resolve(QueryData::Categories(vec![category(7, "Travel")]));
        app.request_delete();
        assert_eq!(app.state, AppState::ConfirmingDelete);
        let pending = app.pending_delete.as_ref().expect("pending");
        assert_eq!(pending.label, "category \"Travel\"");
        assert_eq!(pending.submission, Submission::DeleteCategory(Uuid::from_u128(7)));

        app.cancel_delete();
        assert!(app.pending_delete.is_none());
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_transactions_split_by_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        app.cache.resolve(QueryData::Transactions(vec![
            transaction(1, "income"),
            transaction(2, "expense"),
            transaction(3, "expense"),
        ]));
        app.current_tab = Tab::Transactions;

        assert_eq!(app.income_transactions().len(), 1);
        assert_eq!(app.expense_transactions().len(), 2);

        app.move_selection(1);
        assert_eq!(app.selected_transaction().map(|t| t.id), Some(Uuid::from_u128(3)));
        app.toggle_tx_column();
        assert_eq!(app.selected_transaction().map(|t| t.id), Some(Uuid::from_u128(1)));
    }

    #[test]
    fn test_budget_period_navigation_resets_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(&dir);
        let start = app.budget_period;
        app.budget_selection = 3;
        app.next_budget_period();
        assert_eq!(app.budget_period, start.next());
        assert_eq!(app.budget_selection, 0);
        app.prev_budget_period();
        assert_eq!(app.budget_period, start);
    }

    #[test]
    fn test_summary_defaults_to_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test_app(&dir);
        assert_eq!(app.summary(), TransactionSummary::default());
        assert!(app.recent_transactions().is_empty());
    }

    #[test]
    fn test_can_add_email_char() {
        assert!(can_add_email_char(0, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(!can_add_email_char(MAX_EMAIL_LENGTH, 'a'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, ' '));
        assert!(!can_add_password_char(0, '\n'));
        assert!(!can_add_password_char(MAX_PASSWORD_LENGTH, 'a'));
    }
}

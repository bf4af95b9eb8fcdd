//! In-memory query cache.
//!
//! Every list or summary the UI shows is a query identified by a `QueryKey`.
//! A query keeps its last data while it refetches, so screens never flash
//! empty. Mutations mark the affected queries invalidated instead of editing
//! cached data locally; the next refresh pass refetches them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Budget, BudgetPeriod, Category, MonthlyTotals, Transaction, TransactionSummary, User};

use super::manager::CachedData;

/// Number of rows the dashboard shows under "Recent transactions"
pub const RECENT_TRANSACTIONS_LIMIT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    CurrentUser,
    Categories,
    Transactions,
    RecentTransactions,
    TransactionSummary,
    MonthlyData { year: i32 },
    Budgets(BudgetPeriod),
}

/// Groups of keys that are invalidated together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryScope {
    CurrentUser,
    Categories,
    Transactions,
    RecentTransactions,
    TransactionSummary,
    /// Every year
    MonthlyData,
    /// Every month
    Budgets,
}

impl QueryKey {
    pub fn scope(&self) -> QueryScope {
        match self {
            QueryKey::CurrentUser => QueryScope::CurrentUser,
            QueryKey::Categories => QueryScope::Categories,
            QueryKey::Transactions => QueryScope::Transactions,
            QueryKey::RecentTransactions => QueryScope::RecentTransactions,
            QueryKey::TransactionSummary => QueryScope::TransactionSummary,
            QueryKey::MonthlyData { .. } => QueryScope::MonthlyData,
            QueryKey::Budgets(_) => QueryScope::Budgets,
        }
    }

    /// File stem used for the on-disk snapshot
    pub fn snapshot_name(&self) -> String {
        match self {
            QueryKey::CurrentUser => "current_user".to_string(),
            QueryKey::Categories => "categories".to_string(),
            QueryKey::Transactions => "transactions".to_string(),
            QueryKey::RecentTransactions => "recent_transactions".to_string(),
            QueryKey::TransactionSummary => "transaction_summary".to_string(),
            QueryKey::MonthlyData { year } => format!("monthly_{}", year),
            QueryKey::Budgets(p) => format!("budgets_{}_{:02}", p.year, p.month),
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKey::CurrentUser => write!(f, "profile"),
            QueryKey::Categories => write!(f, "categories"),
            QueryKey::Transactions => write!(f, "transactions"),
            QueryKey::RecentTransactions => write!(f, "recent transactions"),
            QueryKey::TransactionSummary => write!(f, "summary"),
            QueryKey::MonthlyData { year } => write!(f, "monthly totals {}", year),
            QueryKey::Budgets(p) => write!(f, "budgets {}", p),
        }
    }
}

/// A fetched payload, tagged with the query it answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "query", content = "data", rename_all = "snake_case")]
pub enum QueryData {
    CurrentUser(User),
    Categories(Vec<Category>),
    Transactions(Vec<Transaction>),
    RecentTransactions(Vec<Transaction>),
    TransactionSummary(TransactionSummary),
    MonthlyData { year: i32, months: Vec<MonthlyTotals> },
    Budgets { period: BudgetPeriod, budgets: Vec<Budget> },
}

impl QueryData {
    pub fn key(&self) -> QueryKey {
        match self {
            QueryData::CurrentUser(_) => QueryKey::CurrentUser,
            QueryData::Categories(_) => QueryKey::Categories,
            QueryData::Transactions(_) => QueryKey::Transactions,
            QueryData::RecentTransactions(_) => QueryKey::RecentTransactions,
            QueryData::TransactionSummary(_) => QueryKey::TransactionSummary,
            QueryData::MonthlyData { year, .. } => QueryKey::MonthlyData { year: *year },
            QueryData::Budgets { period, .. } => QueryKey::Budgets(*period),
        }
    }
}

/// Write operations and the queries each one makes stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateTransaction,
    UpdateTransaction,
    DeleteTransaction,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    CreateBudget,
    UpdateBudget,
    DeleteBudget,
    UpdateProfile,
}

impl Mutation {
    pub fn invalidates(&self) -> &'static [QueryScope] {
        use QueryScope::*;
        match self {
            Mutation::CreateTransaction | Mutation::UpdateTransaction | Mutation::DeleteTransaction => &[
                Transactions,
                TransactionSummary,
                RecentTransactions,
                MonthlyData,
                Budgets,
            ],
            Mutation::CreateCategory | Mutation::UpdateCategory | Mutation::DeleteCategory => {
                &[Categories, Budgets, Transactions]
            }
            Mutation::CreateBudget | Mutation::UpdateBudget | Mutation::DeleteBudget => &[Budgets],
            Mutation::UpdateProfile => &[CurrentUser],
        }
    }

    /// Status bar text after the server accepted the write
    pub fn success_message(&self) -> &'static str {
        match self {
            Mutation::CreateTransaction => "Transaction created",
            Mutation::UpdateTransaction => "Transaction updated",
            Mutation::DeleteTransaction => "Transaction deleted",
            Mutation::CreateCategory => "Category created",
            Mutation::UpdateCategory => "Category updated",
            Mutation::DeleteCategory => "Category deleted",
            Mutation::CreateBudget => "Budget created",
            Mutation::UpdateBudget => "Budget updated",
            Mutation::DeleteBudget => "Budget deleted",
            Mutation::UpdateProfile => "Profile updated",
        }
    }
}

/// State of a single query
#[derive(Debug, Clone)]
pub struct Query<T> {
    cached: Option<CachedData<T>>,
    fetching: bool,
    error: Option<String>,
    invalidated: bool,
    /// Invalidated after the in-flight request was sent; its response is already old
    invalidated_in_flight: bool,
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self {
            cached: None,
            fetching: false,
            error: None,
            invalidated: false,
            invalidated_in_flight: false,
        }
    }
}

impl<T> Query<T> {
    pub fn data(&self) -> Option<&T> {
        self.cached.as_ref().map(|c| &c.data)
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.cached.as_ref().map(|c| c.cached_at)
    }

    pub fn age_display(&self) -> Option<String> {
        self.cached.as_ref().map(|c| c.age_display())
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    /// No data yet and a request is in flight
    pub fn is_loading(&self) -> bool {
        self.fetching && self.cached.is_none()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    fn resolve(&mut self, data: T) {
        self.cached = Some(CachedData::new(data));
        self.fetching = false;
        self.error = None;
        self.invalidated = self.invalidated_in_flight;
        self.invalidated_in_flight = false;
    }

    fn hydrate(&mut self, cached: CachedData<T>) {
        if self.cached.is_none() {
            self.cached = Some(cached);
            self.invalidated = true;
        }
    }
}

/// Type-erased flag operations shared by every slot
trait QueryState {
    fn needs_fetch(&self) -> bool;
    fn begin_fetch(&mut self);
    fn reject(&mut self, error: String);
    fn invalidate(&mut self);
}

impl<T> QueryState for Query<T> {
    fn needs_fetch(&self) -> bool {
        if self.fetching {
            return false;
        }
        match &self.cached {
            None => true,
            Some(cached) => self.invalidated || cached.is_stale(),
        }
    }

    fn begin_fetch(&mut self) {
        self.fetching = true;
        self.invalidated_in_flight = false;
    }

    fn reject(&mut self, error: String) {
        self.fetching = false;
        self.invalidated_in_flight = false;
        self.error = Some(error);
    }

    fn invalidate(&mut self) {
        self.invalidated = true;
        if self.fetching {
            self.invalidated_in_flight = true;
        }
    }
}

#[derive(Debug, Default)]
pub struct QueryCache {
    current_user: Query<User>,
    categories: Query<Vec<Category>>,
    transactions: Query<Vec<Transaction>>,
    recent_transactions: Query<Vec<Transaction>>,
    transaction_summary: Query<TransactionSummary>,
    monthly: HashMap<i32, Query<Vec<MonthlyTotals>>>,
    budgets: HashMap<BudgetPeriod, Query<Vec<Budget>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Accessors =====

    pub fn current_user(&self) -> &Query<User> {
        &self.current_user
    }

    pub fn categories(&self) -> &Query<Vec<Category>> {
        &self.categories
    }

    pub fn transactions(&self) -> &Query<Vec<Transaction>> {
        &self.transactions
    }

    pub fn recent_transactions(&self) -> &Query<Vec<Transaction>> {
        &self.recent_transactions
    }

    pub fn transaction_summary(&self) -> &Query<TransactionSummary> {
        &self.transaction_summary
    }

    pub fn monthly(&self, year: i32) -> Option<&Query<Vec<MonthlyTotals>>> {
        self.monthly.get(&year)
    }

    pub fn budgets(&self, period: BudgetPeriod) -> Option<&Query<Vec<Budget>>> {
        self.budgets.get(&period)
    }

    /// Category list or an empty slice while it loads
    pub fn category_list(&self) -> &[Category] {
        self.categories.data().map(Vec::as_slice).unwrap_or(&[])
    }

    // ===== Lifecycle =====

    fn state(&self, key: &QueryKey) -> Option<&dyn QueryState> {
        match key {
            QueryKey::CurrentUser => Some(&self.current_user),
            QueryKey::Categories => Some(&self.categories),
            QueryKey::Transactions => Some(&self.transactions),
            QueryKey::RecentTransactions => Some(&self.recent_transactions),
            QueryKey::TransactionSummary => Some(&self.transaction_summary),
            QueryKey::MonthlyData { year } => self.monthly.get(year).map(|q| q as &dyn QueryState),
            QueryKey::Budgets(p) => self.budgets.get(p).map(|q| q as &dyn QueryState),
        }
    }

    fn state_mut(&mut self, key: &QueryKey) -> &mut dyn QueryState {
        match key {
            QueryKey::CurrentUser => &mut self.current_user,
            QueryKey::Categories => &mut self.categories,
            QueryKey::Transactions => &mut self.transactions,
            QueryKey::RecentTransactions => &mut self.recent_transactions,
            QueryKey::TransactionSummary => &mut self.transaction_summary,
            QueryKey::MonthlyData { year } => self.monthly.entry(*year).or_default(),
            QueryKey::Budgets(p) => self.budgets.entry(*p).or_default(),
        }
    }

    /// Not fetching, and no data, invalidated, or older than the freshness window
    pub fn needs_fetch(&self, key: &QueryKey) -> bool {
        self.state(key).map_or(true, |s| s.needs_fetch())
    }

    /// Keys among `keys` that should be requested now
    pub fn pending(&self, keys: &[QueryKey]) -> Vec<QueryKey> {
        keys.iter().copied().filter(|k| self.needs_fetch(k)).collect()
    }

    pub fn begin_fetch(&mut self, key: &QueryKey) {
        self.state_mut(key).begin_fetch();
    }

    /// Store a successful fetch
    pub fn resolve(&mut self, data: QueryData) {
        match data {
            QueryData::CurrentUser(user) => self.current_user.resolve(user),
            QueryData::Categories(list) => self.categories.resolve(list),
            QueryData::Transactions(list) => self.transactions.resolve(list),
            QueryData::RecentTransactions(list) => self.recent_transactions.resolve(list),
            QueryData::TransactionSummary(summary) => self.transaction_summary.resolve(summary),
            QueryData::MonthlyData { year, months } => {
                self.monthly.entry(year).or_default().resolve(months)
            }
            QueryData::Budgets { period, budgets } => {
                self.budgets.entry(period).or_default().resolve(budgets)
            }
        }
    }

    /// Record a failed fetch; previous data stays visible
    pub fn reject(&mut self, key: &QueryKey, error: impl Into<String>) {
        self.state_mut(key).reject(error.into());
    }

    /// Load a disk snapshot. It renders immediately but is refetched on the next pass.
    pub fn hydrate(&mut self, snapshot: CachedData<QueryData>) {
        let at = snapshot.cached_at;
        match snapshot.data {
            QueryData::CurrentUser(user) => self.current_user.hydrate(stamped(user, at)),
            QueryData::Categories(list) => self.categories.hydrate(stamped(list, at)),
            QueryData::Transactions(list) => self.transactions.hydrate(stamped(list, at)),
            QueryData::RecentTransactions(list) => {
                self.recent_transactions.hydrate(stamped(list, at))
            }
            QueryData::TransactionSummary(summary) => {
                self.transaction_summary.hydrate(stamped(summary, at))
            }
            QueryData::MonthlyData { year, months } => {
                self.monthly.entry(year).or_default().hydrate(stamped(months, at))
            }
            QueryData::Budgets { period, budgets } => {
                self.budgets.entry(period).or_default().hydrate(stamped(budgets, at))
            }
        }
    }

    pub fn invalidate(&mut self, scope: QueryScope) {
        match scope {
            QueryScope::CurrentUser => self.current_user.invalidate(),
            QueryScope::Categories => self.categories.invalidate(),
            QueryScope::Transactions => self.transactions.invalidate(),
            QueryScope::RecentTransactions => self.recent_transactions.invalidate(),
            QueryScope::TransactionSummary => self.transaction_summary.invalidate(),
            QueryScope::MonthlyData => self.monthly.values_mut().for_each(|q| q.invalidate()),
            QueryScope::Budgets => self.budgets.values_mut().for_each(|q| q.invalidate()),
        }
    }

    /// Invalidate everything a successful mutation affects
    pub fn apply(&mut self, mutation: Mutation) {
        for scope in mutation.invalidates() {
            self.invalidate(*scope);
        }
    }

    pub fn invalidate_all(&mut self) {
        for scope in [
            QueryScope::CurrentUser,
            QueryScope::Categories,
            QueryScope::Transactions,
            QueryScope::RecentTransactions,
            QueryScope::TransactionSummary,
            QueryScope::MonthlyData,
            QueryScope::Budgets,
        ] {
            self.invalidate(scope);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn stamped<T>(data: T, cached_at: DateTime<Utc>) -> CachedData<T> {
    CachedData { data, cached_at }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn category(n: u128) -> Category {
        serde_json::from_value(serde_json::json!({
            "id": uuid::Uuid::from_u128(n),
            "name": format!("Category {}", n),
            "color": "#6366f1",
            "icon": "tag",
            "user_id": uuid::Uuid::from_u128(99),
            "created_at": "2025-01-01T00:00:00"
        }))
        .expect("valid category json")
    }

    fn period() -> BudgetPeriod {
        BudgetPeriod { year: 2025, month: 3 }
    }

    #[test]
    fn test_empty_query_needs_fetch() {
        let cache = QueryCache::new();
        assert!(cache.needs_fetch(&QueryKey::Categories));
        assert!(cache.needs_fetch(&QueryKey::Budgets(period())));
        assert!(cache.budgets(period()).is_none());
    }

    #[test]
    fn test_fetching_query_is_not_refetched() {
        let mut cache = QueryCache::new();
        cache.begin_fetch(&QueryKey::Categories);
        assert!(!cache.needs_fetch(&QueryKey::Categories));
        assert!(cache.categories().is_loading());
    }

    #[test]
    fn test_resolve_stores_fresh_data() {
        let mut cache = QueryCache::new();
        cache.begin_fetch(&QueryKey::Categories);
        cache.resolve(QueryData::Categories(vec![category(1)]));

        assert!(!cache.needs_fetch(&QueryKey::Categories));
        assert!(!cache.categories().is_fetching());
        assert_eq!(cache.category_list().len(), 1);
    }

    #[test]
    fn test_reject_keeps_previous_data() {
        let mut cache = QueryCache::new();
        cache.resolve(QueryData::Categories(vec![category(1)]));
        cache.invalidate(QueryScope::Categories);
        cache.begin_fetch(&QueryKey::Categories);
        cache.reject(&QueryKey::Categories, "Server error: boom");

        assert_eq!(cache.categories().error(), Some("Server error: boom"));
        assert_eq!(cache.category_list().len(), 1);
        // still invalidated, so the next pass retries
        assert!(cache.needs_fetch(&QueryKey::Categories));
    }

    #[test]
    fn test_invalidation_during_fetch_survives_resolve() {
        let mut cache = QueryCache::new();
        cache.resolve(QueryData::Transactions(vec![]));
        cache.invalidate(QueryScope::Transactions);
        cache.begin_fetch(&QueryKey::Transactions);

        // a write lands while the old request is still out
        cache.apply(Mutation::CreateTransaction);
        cache.resolve(QueryData::Transactions(vec![]));

        assert!(cache.transactions().is_invalidated());
        assert!(cache.needs_fetch(&QueryKey::Transactions));

        // the follow-up fetch clears it
        cache.begin_fetch(&QueryKey::Transactions);
        cache.resolve(QueryData::Transactions(vec![]));
        assert!(!cache.needs_fetch(&QueryKey::Transactions));
    }

    #[test]
    fn test_invalidated_data_stays_visible() {
        let mut cache = QueryCache::new();
        cache.resolve(QueryData::Categories(vec![category(1), category(2)]));
        cache.invalidate(QueryScope::Categories);

        assert!(cache.needs_fetch(&QueryKey::Categories));
        assert_eq!(cache.category_list().len(), 2);
    }

    #[test]
    fn test_old_data_needs_fetch() {
        let mut cache = QueryCache::new();
        cache.transaction_summary.cached = Some(CachedData {
            data: TransactionSummary::default(),
            cached_at: Utc::now() - Duration::minutes(6),
        });
        assert!(cache.needs_fetch(&QueryKey::TransactionSummary));

        cache.resolve(QueryData::TransactionSummary(TransactionSummary {
            total_income: Decimal::new(100, 0),
            ..Default::default()
        }));
        assert!(!cache.needs_fetch(&QueryKey::TransactionSummary));
    }

    #[test]
    fn test_transaction_mutation_invalidates_dependents() {
        let mut cache = QueryCache::new();
        cache.resolve(QueryData::Transactions(vec![]));
        cache.resolve(QueryData::RecentTransactions(vec![]));
        cache.resolve(QueryData::TransactionSummary(TransactionSummary::default()));
        cache.resolve(QueryData::MonthlyData { year: 2025, months: vec![] });
        cache.resolve(QueryData::Budgets { period: period(), budgets: vec![] });
        cache.resolve(QueryData::Budgets { period: period().next(), budgets: vec![] });
        cache.resolve(QueryData::Categories(vec![]));

        cache.apply(Mutation::CreateTransaction);

        assert!(cache.needs_fetch(&QueryKey::Transactions));
        assert!(cache.needs_fetch(&QueryKey::RecentTransactions));
        assert!(cache.needs_fetch(&QueryKey::TransactionSummary));
        assert!(cache.needs_fetch(&QueryKey::MonthlyData { year: 2025 }));
        assert!(cache.needs_fetch(&QueryKey::Budgets(period())));
        assert!(cache.needs_fetch(&QueryKey::Budgets(period().next())));
        assert!(!cache.needs_fetch(&QueryKey::Categories));
    }

    #[test]
    fn test_budget_mutation_only_touches_budgets() {
        let mut cache = QueryCache::new();
        cache.resolve(QueryData::Transactions(vec![]));
        cache.resolve(QueryData::Budgets { period: period(), budgets: vec![] });

        cache.apply(Mutation::DeleteBudget);

        assert!(cache.needs_fetch(&QueryKey::Budgets(period())));
        assert!(!cache.needs_fetch(&QueryKey::Transactions));
    }

    #[test]
    fn test_category_mutation_invalidates_budgets_and_transactions() {
        let invalidated = Mutation::DeleteCategory.invalidates();
        assert!(invalidated.contains(&QueryScope::Categories));
        assert!(invalidated.contains(&QueryScope::Budgets));
        assert!(invalidated.contains(&QueryScope::Transactions));
        assert!(!invalidated.contains(&QueryScope::TransactionSummary));
        assert_eq!(Mutation::UpdateProfile.invalidates(), &[QueryScope::CurrentUser]);
    }

    #[test]
    fn test_hydrate_marks_invalidated_and_keeps_timestamp() {
        let mut cache = QueryCache::new();
        let cached_at = Utc::now() - Duration::minutes(1);
        cache.hydrate(CachedData {
            data: QueryData::Categories(vec![category(1)]),
            cached_at,
        });

        assert_eq!(cache.categories().fetched_at(), Some(cached_at));
        assert!(cache.categories().is_invalidated());
        assert!(cache.needs_fetch(&QueryKey::Categories));
    }

    #[test]
    fn test_hydrate_does_not_overwrite_live_data() {
        let mut cache = QueryCache::new();
        cache.resolve(QueryData::Categories(vec![category(1), category(2)]));
        cache.hydrate(CachedData {
            data: QueryData::Categories(vec![category(3)]),
            cached_at: Utc::now(),
        });
        assert_eq!(cache.category_list().len(), 2);
    }

    #[test]
    fn test_pending_filters_fresh_keys() {
        let mut cache = QueryCache::new();
        cache.resolve(QueryData::Categories(vec![]));
        let pending = cache.pending(&[QueryKey::Categories, QueryKey::Transactions]);
        assert_eq!(pending, vec![QueryKey::Transactions]);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut cache = QueryCache::new();
        cache.resolve(QueryData::Categories(vec![category(1)]));
        cache.resolve(QueryData::Budgets { period: period(), budgets: vec![] });
        cache.clear();
        assert!(cache.categories().data().is_none());
        assert!(cache.budgets(period()).is_none());
    }

    #[test]
    fn test_data_key_round_trip() {
        let data = QueryData::MonthlyData { year: 2024, months: vec![] };
        assert_eq!(data.key(), QueryKey::MonthlyData { year: 2024 });
        assert_eq!(QueryKey::Budgets(period()).snapshot_name(), "budgets_2025_03");
        assert_eq!(QueryKey::MonthlyData { year: 2024 }.scope(), QueryScope::MonthlyData);
    }
}

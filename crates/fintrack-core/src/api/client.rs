//! API client for the finance backend.
//!
//! `ApiClient` wraps a `reqwest::Client` with the base URL and the bearer
//! token of the logged-in user. Every method returns `anyhow::Result`; HTTP
//! failures carry an `ApiError` that callers can downcast.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cache::{QueryData, QueryKey, RECENT_TRANSACTIONS_LIMIT};
use crate::models::{
    AuthToken, Budget, BudgetPeriod, BudgetUpdate, Category, CategoryUpdate, MonthlyTotals,
    NewBudget, NewCategory, NewTransaction, NewUser, Transaction, TransactionFilters,
    TransactionSummary, TransactionUpdate, User, UserUpdate,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Backend address used when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the finance backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000/api/v1`)
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self
            .authorized(request)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send request: {}", what))?;

        let response = Self::check_response(response)
            .await
            .with_context(|| format!("Request failed: {}", what))?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response: {}", what))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        self.send_json(self.client.get(&url), &format!("GET {}", path)).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        self.send_json(self.client.get(&url).query(query), &format!("GET {}", path))
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        self.send_json(self.client.post(&url).json(body), &format!("POST {}", path))
            .await
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "PATCH");
        self.send_json(self.client.patch(&url).json(body), &format!("PATCH {}", path))
            .await
    }

    /// DELETE endpoints answer 204 with no body
    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!(url = %url, "DELETE");
        let response = self
            .authorized(self.client.delete(&url))
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send request: DELETE {}", path))?;
        Self::check_response(response)
            .await
            .with_context(|| format!("Request failed: DELETE {}", path))?;
        Ok(())
    }

    // ===== Auth & Profile =====

    /// Exchange credentials for a bearer token (OAuth2 password form)
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken> {
        let url = self.url("/auth/login");
        debug!(url = %url, "POST login");
        let request = self
            .client
            .post(&url)
            .form(&[("username", email), ("password", password)]);
        self.send_json(request, "login").await
    }

    pub async fn register(&self, user: &NewUser) -> Result<User> {
        self.post("/auth/register", user).await
    }

    pub async fn current_user(&self) -> Result<User> {
        self.get("/users/me").await
    }

    pub async fn update_current_user(&self, update: &UserUpdate) -> Result<User> {
        self.patch("/users/me", update).await
    }

    // ===== Categories =====

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.get("/categories").await
    }

    pub async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        self.post("/categories", category).await
    }

    pub async fn update_category(&self, id: Uuid, update: &CategoryUpdate) -> Result<Category> {
        self.patch(&format!("/categories/{}", id), update).await
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<()> {
        self.delete(&format!("/categories/{}", id)).await
    }

    // ===== Transactions =====

    pub async fn list_transactions(&self, filters: &TransactionFilters) -> Result<Vec<Transaction>> {
        self.get_with_query("/transactions", filters).await
    }

    /// Totals over an optional date range
    pub async fn transaction_summary(
        &self,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
    ) -> Result<TransactionSummary> {
        let mut query = Vec::new();
        if let Some(start) = start_date {
            query.push(("start_date", start.format("%Y-%m-%dT%H:%M:%S").to_string()));
        }
        if let Some(end) = end_date {
            query.push(("end_date", end.format("%Y-%m-%dT%H:%M:%S").to_string()));
        }
        self.get_with_query("/transactions/summary", &query).await
    }

    /// Income and expense per month; the server defaults to the current year
    pub async fn monthly_totals(&self, year: Option<i32>) -> Result<Vec<MonthlyTotals>> {
        match year {
            Some(y) => {
                self.get_with_query("/transactions/monthly", &[("year", y)])
                    .await
            }
            None => self.get("/transactions/monthly").await,
        }
    }

    pub async fn create_transaction(&self, transaction: &NewTransaction) -> Result<Transaction> {
        self.post("/transactions", transaction).await
    }

    pub async fn update_transaction(
        &self,
        id: Uuid,
        update: &TransactionUpdate,
    ) -> Result<Transaction> {
        self.patch(&format!("/transactions/{}", id), update).await
    }

    pub async fn delete_transaction(&self, id: Uuid) -> Result<()> {
        self.delete(&format!("/transactions/{}", id)).await
    }

    // ===== Budgets =====

    /// Budgets for one month, with server-computed spending
    pub async fn list_budgets(&self, period: BudgetPeriod) -> Result<Vec<Budget>> {
        self.get_with_query(
            "/budgets",
            &[("month", period.month as i32), ("year", period.year)],
        )
        .await
    }

    pub async fn create_budget(&self, budget: &NewBudget) -> Result<Budget> {
        self.post("/budgets", budget).await
    }

    pub async fn update_budget(&self, id: Uuid, update: &BudgetUpdate) -> Result<Budget> {
        self.patch(&format!("/budgets/{}", id), update).await
    }

    pub async fn delete_budget(&self, id: Uuid) -> Result<()> {
        self.delete(&format!("/budgets/{}", id)).await
    }

    // ===== Queries =====

    /// Fetch whatever backs a cache key
    pub async fn fetch_query(&self, key: &QueryKey) -> Result<QueryData> {
        let data = match *key {
            QueryKey::CurrentUser => QueryData::CurrentUser(self.current_user().await?),
            QueryKey::Categories => QueryData::Categories(self.list_categories().await?),
            QueryKey::Transactions => QueryData::Transactions(
                self.list_transactions(&TransactionFilters::default()).await?,
            ),
            QueryKey::RecentTransactions => QueryData::RecentTransactions(
                self.list_transactions(&TransactionFilters::recent(RECENT_TRANSACTIONS_LIMIT))
                    .await?,
            ),
            QueryKey::TransactionSummary => {
                QueryData::TransactionSummary(self.transaction_summary(None, None).await?)
            }
            QueryKey::MonthlyData { year } => QueryData::MonthlyData {
                year,
                months: self.monthly_totals(Some(year)).await?,
            },
            QueryKey::Budgets(period) => QueryData::Budgets {
                period,
                budgets: self.list_budgets(period).await?,
            },
        };
        Ok(data)
    }
}

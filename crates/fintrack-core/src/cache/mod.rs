//! Client-side caching.
//!
//! `QueryCache` holds the live state of every query the UI reads, with
//! invalidation driven by `Mutation`s. `CacheManager` writes each successful
//! fetch to a JSON snapshot so the next launch can render immediately.

pub mod manager;
pub mod query;

pub use manager::{CacheManager, CachedData};
pub use query::{Mutation, Query, QueryCache, QueryData, QueryKey, QueryScope, RECENT_TRANSACTIONS_LIMIT};

//! Core library for fintrack.
//!
//! Everything that does not depend on a terminal lives here:
//!
//! - `api`: REST client for the finance backend
//! - `auth`: persisted session token
//! - `cache`: query cache with invalidation-on-mutation, plus on-disk snapshots
//! - `models`: backend DTOs and derived values
//! - `forms`: client-side validation producing request bodies
//! - `config`: configuration file and directories
//! - `utils`: display formatting

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod forms;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Session, SessionData};
pub use cache::{CacheManager, Mutation, Query, QueryCache, QueryData, QueryKey, QueryScope};
pub use config::Config;

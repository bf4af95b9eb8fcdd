//! REST client for the finance backend.
//!
//! Authentication is OAuth2 password flow: `login` posts a form and returns a
//! bearer token that every later request carries.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use error::ApiError;

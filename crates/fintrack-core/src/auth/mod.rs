//! Session persistence.
//!
//! The bearer token returned by login is written to `session.json` and
//! reused until it expires 24 hours after it was issued.

pub mod session;

pub use session::{Session, SessionData};

//!
//! sitedesk storage module
//! -----------------------
//! Backends for the three record families the service persists: sessions,
//! users, and content items. Each family is reached through its own trait
//! (`SessionStore`, `UserStore`, `ContentRepo`) so that handlers never know
//! which backend is in use.
//!
//! Two backends are provided:
//! - `MemoryStore`: process-local maps behind `parking_lot` locks. Used for
//!   development runs without a database and throughout the tests.
//! - `PgStore`: PostgreSQL over a single pipelined `tokio_postgres::Client`.
//!   Timestamps are stored as epoch milliseconds (`BIGINT`).

use chrono::{DateTime, TimeZone, Utc};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Failures reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or the statement failed to run.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A row exists but cannot be turned back into a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 { ts.timestamp_millis() }

pub(crate) fn from_millis(ms: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {}", ms)))
}

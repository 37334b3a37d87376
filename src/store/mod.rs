//! # store — Trade Persistence
//!
//! [`TradeStore`] is the only seam between the API and durable storage.  Each
//! method is a single-row operation; there is no cross-trade transaction and
//! concurrent writers to the same id resolve as last-write-wins.
//!
//! ## Backends
//! - [`memory::MemoryTradeStore`] — default, process-local
//! - `postgres::PgTradeStore`     — `--features postgres` + `DATABASE_URL`

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Trade, TradeFields};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryTradeStore;

/// Infrastructure failure inside a store backend.
#[derive(Debug, Error)]
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
pub enum StoreError {
    /// The backend could not be reached (pool timeout, connection refused).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the statement.
    #[error("store query failed: {0}")]
    Query(String),

    /// A stored row could not be decoded back into a trade.
    #[error("corrupt trade row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait TradeStore: Send + Sync {
    /// All trades, most recently created first.
    async fn list(&self) -> Result<Vec<Trade>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Trade>, StoreError>;

    /// Persists a new trade, assigning its id and timestamps.
    async fn insert(&self, fields: TradeFields) -> Result<Trade, StoreError>;

    /// Overwrites every field of trade `id`.  `Ok(None)` if it does not exist.
    async fn replace(&self, id: i64, fields: TradeFields) -> Result<Option<Trade>, StoreError>;

    /// `Ok(false)` if there was nothing to delete.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

//! # store::memory
//!
//! Process-local trade store.  Used when no database is configured and by the
//! test suite.  Contents are lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{StoreError, TradeStore};
use crate::models::{Trade, TradeFields};

#[derive(Debug)]
struct Inner {
    trades: BTreeMap<i64, Trade>,
    /// Last id handed out.  Ids are never reused, even after a delete.
    last_id: i64,
}

#[derive(Debug)]
pub struct MemoryTradeStore {
    inner: RwLock<Inner>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                trades: BTreeMap::new(),
                last_id: 0,
            }),
        }
    }
}

impl Default for MemoryTradeStore {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn list(&self) -> Result<Vec<Trade>, StoreError> {
        let inner = self.inner.read().await;
        // Ids are handed out in creation order, so descending id = newest first.
        Ok(inner.trades.values().rev().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Trade>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.trades.get(&id).cloned())
    }

    async fn insert(&self, fields: TradeFields) -> Result<Trade, StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;

        let now = Utc::now();
        let trade = Trade {
            id: inner.last_id,
            fields,
            created_at: now,
            updated_at: now,
        };
        inner.trades.insert(trade.id, trade.clone());
        Ok(trade)
    }

    async fn replace(&self, id: i64, fields: TradeFields) -> Result<Option<Trade>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.trades.get_mut(&id).map(|trade| {
            trade.fields = fields;
            trade.updated_at = Utc::now();
            trade.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.trades.remove(&id).is_some())
    }
}

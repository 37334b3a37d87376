//! # state
//!
//! Shared state injected into every Axum handler.  The store is the only
//! mutable thing in the process; everything else is fixed at startup.

use std::sync::Arc;

use crate::store::TradeStore;
use crate::validation::ValidationPolicy;

pub struct AppState {
    pub store: Arc<dyn TradeStore>,
    /// Required-field policy applied on create and update.
    pub policy: ValidationPolicy,
    /// Expected `X-API-Key`.  `None` = dev mode.
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn TradeStore>, policy: ValidationPolicy) -> Self {
        Self { store, policy, api_key: None }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

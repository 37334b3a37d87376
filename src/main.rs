//! # Trade Journal — Backend
//!
//! ```text
//!  ┌─────────────┐  /api/v1/trades       ┌──────────────────────────────┐
//!  │  Journal UI │ ────────────────────▶ │ routes::trades               │
//!  └─────────────┘  { "trade": {...} }   │   └─ validation::validate ── │
//!                                        │          │                   │
//!                                        │          ▼                   │
//!                                        │   dyn TradeStore             │
//!                                        │   ├─ MemoryTradeStore        │
//!                                        │   └─ PgTradeStore (postgres) │
//!                                        └──────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod auth;
mod config;
mod error;
mod models;
mod routes;
mod state;
mod store;
mod validation;

use config::AppConfig;
use state::AppState;
use store::{MemoryTradeStore, TradeStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("trade_journal=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    // ── 3. Config ─────────────────────────────────────────────────────────────
    let config = AppConfig::from_env()?;
    info!(
        exit_policy = %config.policy.exit,
        auth = config.api_key.is_some(),
        "Trade journal starting"
    );

    // ── 4. Store + shared state ───────────────────────────────────────────────
    let store = build_store(&config).await?;
    let state = Arc::new(AppState::new(store, config.policy).with_api_key(config.api_key.clone()));

    // ── 5. CORS ───────────────────────────────────────────────────────────────
    let cors = build_cors(config.cors_origin.as_deref())?;

    // ── 6. Router ─────────────────────────────────────────────────────────────
    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // ── 7. Bind & Serve ───────────────────────────────────────────────────────
    info!(addr = ?config.bind_addr, "Trade journal server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let allow_origin = match origin {
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin).context("CORS_ORIGIN must be a valid header value")?,
        ),
        None => AllowOrigin::from(Any),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any))
}

#[cfg(feature = "postgres")]
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn TradeStore>> {
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = store::postgres::init_pool(url, config.db_max_connections).await?;
            Ok(Arc::new(store::postgres::PgTradeStore::new(pool)))
        }
        None => {
            info!("DATABASE_URL not set — using in-memory trade store");
            Ok(Arc::new(MemoryTradeStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn TradeStore>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but built without the `postgres` feature — ignoring it");
    }
    info!("Using in-memory trade store");
    Ok(Arc::new(MemoryTradeStore::new()))
}

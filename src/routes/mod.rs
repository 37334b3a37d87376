//! HTTP surface.
//!
//! | Method       | Path                  | Handler                      |
//! |--------------|-----------------------|------------------------------|
//! | GET          | `/health`             | [`health::health_check`]     |
//! | GET          | `/api/v1/trades`      | [`trades::list_trades`]      |
//! | POST         | `/api/v1/trades`      | [`trades::create_trade`]     |
//! | GET          | `/api/v1/trades/:id`  | [`trades::get_trade`]        |
//! | PATCH / PUT  | `/api/v1/trades/:id`  | [`trades::update_trade`]     |
//! | DELETE       | `/api/v1/trades/:id`  | [`trades::delete_trade`]     |

use axum::{routing::get, Router};

use crate::auth::require_api_key;
use crate::state::SharedState;

pub mod health;
pub mod trades;

/// Application routes plus the API key gate.  Transport layers (CORS,
/// tracing) are added by `main`.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/trades",
            get(trades::list_trades).post(trades::create_trade),
        )
        .route(
            "/api/v1/trades/:id",
            get(trades::get_trade)
                .patch(trades::update_trade)
                .put(trades::update_trade)
                .delete(trades::delete_trade),
        )
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

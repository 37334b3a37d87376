use axum::{response::IntoResponse, Json};
use serde_json::json;

/// GET /health — liveness probe, exempt from the API key.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "ok":      true,
        "service": "trade-journal",
    }))
}

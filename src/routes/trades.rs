//! # routes::trades
//!
//! Trade CRUD.  Create and update both run the candidate through
//! [`validate`] first; a rejected candidate never reaches the store.
//!
//! Request bodies are wrapped: `{ "trade": { … } }`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use crate::{
    error::AppError,
    models::{Trade, TradeEnvelope, TradeParams, TradePatch},
    state::SharedState,
    validation::validate,
};

/// GET /api/v1/trades — newest first
pub async fn list_trades(State(state): State<SharedState>) -> Result<Json<Vec<Trade>>, AppError> {
    let trades = state.store.list().await?;
    debug!(count = trades.len(), "listed trades");
    Ok(Json(trades))
}

/// GET /api/v1/trades/:id
pub async fn get_trade(
    State(state): State<SharedState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Trade>, AppError> {
    let Path(id) = path?;
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::trade_not_found(id))
}

/// POST /api/v1/trades
pub async fn create_trade(
    State(state): State<SharedState>,
    payload: Result<Json<TradeEnvelope<TradeParams>>, JsonRejection>,
) -> Result<(StatusCode, Json<Trade>), AppError> {
    let Json(TradeEnvelope { trade: candidate }) = payload?;

    let fields = validate(&candidate, &state.policy).map_err(AppError::Validation)?;
    let trade = state.store.insert(fields).await?;

    info!(
        id = trade.id,
        ticker = %trade.fields.ticker,
        trade_type = %trade.trade_type(),
        open = trade.fields.is_open(),
        "trade recorded"
    );
    Ok((StatusCode::CREATED, Json(trade)))
}

/// PATCH | PUT /api/v1/trades/:id
///
/// The patch is merged over the stored trade and the result validated as a
/// whole, so switching `trade_type` must bring the new leg's fields along.
pub async fn update_trade(
    State(state): State<SharedState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TradeEnvelope<TradePatch>>, JsonRejection>,
) -> Result<Json<Trade>, AppError> {
    let Path(id) = path?;
    let Json(TradeEnvelope { trade: patch }) = payload?;

    let current = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::trade_not_found(id))?;

    let candidate = patch.apply(TradeParams::from(&current));
    let fields = validate(&candidate, &state.policy).map_err(AppError::Validation)?;

    // The trade can disappear between the read and the write.
    let trade = state
        .store
        .replace(id, fields)
        .await?
        .ok_or_else(|| AppError::trade_not_found(id))?;

    info!(id, trade_type = %trade.trade_type(), "trade updated");
    Ok(Json(trade))
}

/// DELETE /api/v1/trades/:id
pub async fn delete_trade(
    State(state): State<SharedState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    if state.store.delete(id).await? {
        info!(id, "trade deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::trade_not_found(id))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::API_KEY_HEADER;
    use crate::routes::router;
    use crate::state::AppState;
    use crate::store::MemoryTradeStore;
    use crate::validation::{ExitPolicy, ValidationPolicy};

    fn app_with(policy: ValidationPolicy, api_key: Option<&str>) -> Router {
        let state = AppState::new(Arc::new(MemoryTradeStore::new()), policy)
            .with_api_key(api_key.map(str::to_string));
        router(Arc::new(state))
    }

    fn app() -> Router {
        app_with(ValidationPolicy::default(), None)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn share_example() -> Value {
        json!({ "trade": {
            "trade_type":     "share",
            "ticker":         "AAPL",
            "shares":         10,
            "entry_price":    150.00,
            "exit_price":     160.00,
            "entry_datetime": "2024-01-02T09:30",
            "exit_datetime":  "2024-01-05T15:00",
        }})
    }

    fn option_example() -> Value {
        json!({ "trade": {
            "trade_type":      "option",
            "ticker":          "SPY",
            "option_type":     "call",
            "contracts":       2,
            "entry_premium":   1.20,
            "exit_premium":    2.50,
            "strike_price":    450,
            "expiration_date": "2024-03-15",
            "entry_datetime":  "2024-02-01T10:00",
            "exit_datetime":   "2024-02-10T14:00",
        }})
    }

    fn error_fields(body: &Value) -> BTreeSet<String> {
        body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap().to_string())
            .collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn create_share_then_get_is_identical() {
        let app = app();
        let (status, created) = send(&app, Method::POST, "/api/v1/trades", Some(share_example())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["ticker"], "AAPL");
        assert_eq!(created["trade_type"], "share");
        assert_eq!(created["shares"], 10);
        assert_eq!(created["entry_price"], 150.0);
        assert_eq!(created["exit_price"], 160.0);
        assert_eq!(created["entry_datetime"], "2024-01-02T09:30:00Z");
        assert_eq!(created["exit_datetime"], "2024-01-05T15:00:00Z");

        let (status, fetched) = send(&app, Method::GET, "/api/v1/trades/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_option_example() {
        let (status, created) = send(&app(), Method::POST, "/api/v1/trades", Some(option_example())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["trade_type"], "option");
        assert_eq!(created["option_type"], "call");
        assert_eq!(created["strike_price"], 450.0);
        assert_eq!(created["expiration_date"], "2024-03-15");
        assert!(created.get("shares").is_none());
    }

    #[tokio::test]
    async fn incomplete_option_is_422_with_all_missing_fields() {
        let app = app();
        let body = json!({ "trade": {
            "trade_type":     "option",
            "ticker":         "SPY",
            "contracts":      2,
            "entry_datetime": "2024-02-01T10:00",
        }});
        let (status, body) = send(&app, Method::POST, "/api/v1/trades", Some(body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["ok"], false);
        assert_eq!(
            error_fields(&body),
            set(&["option_type", "entry_premium", "exit_premium", "strike_price", "expiration_date"])
        );

        let (_, list) = send(&app, Method::GET, "/api/v1/trades", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn form_style_blank_exit_datetime_is_rejected() {
        let mut body = share_example();
        body["trade"]["exit_datetime"] = json!("");
        let (status, body) = send(&app(), Method::POST, "/api/v1/trades", Some(body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["field"], "exit_datetime");
        assert_eq!(body["errors"][0]["code"], "required");
    }

    #[tokio::test]
    async fn open_position_allowed_by_policy() {
        let app = app_with(ValidationPolicy { exit: ExitPolicy::AllowOpen }, None);
        let body = json!({ "trade": {
            "trade_type":     "share",
            "ticker":         "nvda",
            "shares":         "5",
            "entry_price":    "480.10",
            "entry_datetime": "2024-01-02T09:30",
            "exit_datetime":  "",
        }});
        let (status, created) = send(&app, Method::POST, "/api/v1/trades", Some(body)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["ticker"], "NVDA");
        assert_eq!(created["exit_price"], Value::Null);
        assert_eq!(created["exit_datetime"], Value::Null);
    }

    #[tokio::test]
    async fn missing_envelope_is_bad_request() {
        let body = json!({ "ticker": "AAPL", "trade_type": "share" });
        let (status, body) = send(&app(), Method::POST, "/api/v1/trades", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn unknown_fields_are_ignored() {
        let mut body = share_example();
        body["trade"]["leverage"] = json!(20);
        body["trade"]["id"] = json!(999);
        let (status, created) = send(&app(), Method::POST, "/api/v1/trades", Some(body)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert!(created.get("leverage").is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let app = app();
        send(&app, Method::POST, "/api/v1/trades", Some(share_example())).await;
        send(&app, Method::POST, "/api/v1/trades", Some(option_example())).await;

        let (status, list) = send(&app, Method::GET, "/api/v1/trades", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = list.as_array().unwrap().iter().map(|t| t["id"].clone()).collect();
        assert_eq!(ids, [json!(2), json!(1)]);
    }

    #[tokio::test]
    async fn missing_ids_are_404() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/api/v1/trades/41", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, "/api/v1/trades/41", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let patch = json!({ "trade": { "notes": "x" } });
        let (status, _) = send(&app, Method::PATCH, "/api/v1/trades/41", Some(patch)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_numeric_id_is_json_bad_request() {
        let app = app();
        for method in [Method::GET, Method::DELETE] {
            let (status, body) = send(&app, method, "/api/v1/trades/abc", None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["ok"], false);
            assert!(body["error"].is_string());
        }

        let patch = json!({ "trade": { "notes": "x" } });
        let (status, body) = send(&app, Method::PATCH, "/api/v1/trades/abc", Some(patch)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn non_finite_amounts_are_bad_request() {
        let app = app();
        for (field, raw) in [("entry_price", "NaN"), ("exit_price", "inf"), ("entry_price", "1e999")] {
            let mut body = share_example();
            body["trade"][field] = json!(raw);
            let (status, resp) = send(&app, Method::POST, "/api/v1/trades", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{field}={raw}");
            assert_eq!(resp["ok"], false);
        }

        let (_, list) = send(&app, Method::GET, "/api/v1/trades", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn delete_then_get_is_404() {
        let app = app();
        send(&app, Method::POST, "/api/v1/trades", Some(share_example())).await;

        let (status, body) = send(&app, Method::DELETE, "/api/v1/trades/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, Method::GET, "/api/v1/trades/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_merges_over_stored_trade() {
        let app = app();
        send(&app, Method::POST, "/api/v1/trades", Some(share_example())).await;

        let patch = json!({ "trade": { "exit_price": 171.25, "notes": "trimmed into strength" } });
        let (status, updated) = send(&app, Method::PATCH, "/api/v1/trades/1", Some(patch)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["exit_price"], 171.25);
        assert_eq!(updated["notes"], "trimmed into strength");
        assert_eq!(updated["shares"], 10);
        assert_eq!(updated["entry_datetime"], "2024-01-02T09:30:00Z");
    }

    #[tokio::test]
    async fn put_clears_with_null() {
        let app = app();
        let mut body = share_example();
        body["trade"]["notes"] = json!("gap fill");
        send(&app, Method::POST, "/api/v1/trades", Some(body)).await;

        let patch = json!({ "trade": { "notes": null } });
        let (status, updated) = send(&app, Method::PUT, "/api/v1/trades/1", Some(patch)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["notes"], Value::Null);
    }

    #[tokio::test]
    async fn switching_type_purges_the_old_leg() {
        let app = app();
        send(&app, Method::POST, "/api/v1/trades", Some(share_example())).await;

        let mut patch = option_example();
        patch["trade"]["ticker"] = json!("AAPL");
        let (status, updated) = send(&app, Method::PATCH, "/api/v1/trades/1", Some(patch)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["trade_type"], "option");
        assert!(updated.get("shares").is_none());
        assert!(updated.get("entry_price").is_none());

        // Switching back without share fields fails: they were purged.
        let back = json!({ "trade": { "trade_type": "share" } });
        let (status, body) = send(&app, Method::PATCH, "/api/v1/trades/1", Some(back)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            error_fields(&body),
            set(&["shares", "entry_price", "exit_price"])
        );
    }

    #[tokio::test]
    async fn rejected_patch_leaves_store_untouched() {
        let app = app();
        let (_, created) = send(&app, Method::POST, "/api/v1/trades", Some(share_example())).await;

        let patch = json!({ "trade": { "shares": -3, "entry_datetime": null } });
        let (status, body) = send(&app, Method::PATCH, "/api/v1/trades/1", Some(patch)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            error_fields(&body),
            set(&["entry_datetime", "shares"])
        );

        let (_, fetched) = send(&app, Method::GET, "/api/v1/trades/1", None).await;
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn api_key_gate() {
        let app = app_with(ValidationPolicy::default(), Some("s3cret"));

        let (status, _) = send(&app, Method::GET, "/api/v1/trades", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/api/v1/trades")
            .header(API_KEY_HEADER, "s3cret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

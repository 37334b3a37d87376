//! # error
//!
//! Centralised application error type.
//!
//! Every handler returns `Result<_, AppError>`.  Axum's `IntoResponse` impl
//! converts these into structured JSON error bodies so the frontend always
//! gets a machine-readable response, field errors included.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::store::StoreError;
use crate::validation::FieldError;

#[derive(Debug, Error)]
pub enum AppError {
    /// The candidate trade broke one or more field rules.
    #[error("validation failed ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    /// No trade with the requested id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The body could not be decoded at all.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Persistence layer failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn trade_not_found(id: i64) -> Self {
        AppError::NotFound(format!("trade {id} does not exist"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Validation(errors) => {
                debug!(count = errors.len(), "responding with field errors");
                json!({
                    "ok":     false,
                    "error":  "validation failed",
                    "errors": errors,
                })
            }
            AppError::NotFound(msg) | AppError::BadRequest(msg) => json!({
                "ok":    false,
                "error": msg,
            }),
            AppError::Store(err) => {
                error!(error = %err, "trade store failure");
                json!({
                    "ok":    false,
                    "error": "Internal error: trade store unavailable",
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

//! Error taxonomy for the user-facing API surface.
//!
//! The webhook endpoint never uses these: it acknowledges every delivery
//! with HTTP 200 regardless of internal outcome (see `reconcile`).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::backend::BackendError;
use crate::gateway::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or unresolvable request field. Surfaced as 400 with a short
    /// message.
    #[error("{0}")]
    InvalidRequest(String),

    /// The gateway rejected the payment intent. Surfaced with the gateway's
    /// own status code and human-readable message.
    #[error("payment gateway rejected the request: {message}")]
    Gateway { status: u16, message: String },

    /// The VPS backend call failed. Surfaced as a generic 500; detail goes
    /// to the logs only.
    #[error("backend unavailable")]
    Backend(#[source] BackendError),

    /// Transport or parse failure talking to the gateway. Generic 500.
    #[error("internal error")]
    Internal(#[source] GatewayError),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { status, message } => ApiError::Gateway { status, message },
            other => ApiError::Internal(other),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Backend(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": message })),
            )
                .into_response(),
            ApiError::Gateway { status, message } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Backend(source) => {
                tracing::error!("backend call failed: {}", source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": "Internal server error" })),
                )
                    .into_response()
            }
            ApiError::Internal(source) => {
                tracing::error!("gateway call failed: {}", source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

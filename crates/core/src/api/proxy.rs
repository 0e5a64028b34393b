//! Thin proxy endpoints over the backend VPS API.
//!
//! These add input validation (400 on a missing userId) and error wrapping
//! (generic 500 on transport failure) and otherwise pass the backend's
//! status and JSON body through untouched.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::api::AppState;
use crate::error::ApiError;

type ProxyResult = Result<(StatusCode, Json<JsonValue>), ApiError>;

const DEFAULT_INVOICE_METHOD: &str = "cryptobot";
const DEFAULT_INVOICE_ASSET: &str = "USDT";
const DEFAULT_INVOICE_AMOUNT: f64 = 2.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionQuery {
    user_id: Option<i64>,
    device_id: Option<String>,
}

/// GET /api/subscription - Proxy the subscription status lookup.
pub async fn get_subscription(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> ProxyResult {
    let user_id = require_user_id(query.user_id)?;
    let response = state
        .backend
        .get_subscription(user_id, query.device_id.as_deref())
        .await?;
    Ok((response.status, Json(response.body)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesQuery {
    user_id: Option<i64>,
}

/// GET /api/devices - Proxy the device list lookup.
pub async fn get_devices(
    State(state): State<AppState>,
    Query(query): Query<DevicesQuery>,
) -> ProxyResult {
    let user_id = require_user_id(query.user_id)?;
    let response = state.backend.get_devices(user_id).await?;
    Ok((response.status, Json(response.body)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDeviceBody {
    user_id: Option<i64>,
    device_id: Option<String>,
}

/// DELETE /api/devices - Proxy a device removal.
pub async fn delete_device(
    State(state): State<AppState>,
    Json(body): Json<DeleteDeviceBody>,
) -> ProxyResult {
    let (Some(user_id), Some(device_id)) = (body.user_id, body.device_id) else {
        return Err(ApiError::InvalidRequest(
            "Missing userId or deviceId".to_string(),
        ));
    };
    let response = state.backend.delete_device(user_id, &device_id).await?;
    Ok((response.status, Json(response.body)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoBody {
    user_id: Option<i64>,
    promo_code: Option<String>,
}

/// POST /api/activate-promo - Proxy a promo code redemption.
pub async fn activate_promo(
    State(state): State<AppState>,
    Json(body): Json<PromoBody>,
) -> ProxyResult {
    let (Some(user_id), Some(promo_code)) = (body.user_id, body.promo_code) else {
        return Err(ApiError::InvalidRequest(
            "Missing userId or promoCode".to_string(),
        ));
    };
    let response = state.backend.activate_promo(user_id, &promo_code).await?;
    Ok((response.status, Json(response.body)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceBody {
    user_id: Option<i64>,
    method: Option<String>,
    asset: Option<String>,
    amount: Option<f64>,
}

/// POST /api/create-invoice - Proxy crypto invoice creation.
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(body): Json<InvoiceBody>,
) -> ProxyResult {
    let user_id = require_user_id(body.user_id)?;
    let response = state
        .backend
        .create_invoice(
            user_id,
            body.method.as_deref().unwrap_or(DEFAULT_INVOICE_METHOD),
            body.asset.as_deref().unwrap_or(DEFAULT_INVOICE_ASSET),
            body.amount.unwrap_or(DEFAULT_INVOICE_AMOUNT),
        )
        .await?;
    Ok((response.status, Json(response.body)))
}

fn require_user_id(user_id: Option<i64>) -> Result<i64, ApiError> {
    user_id.ok_or_else(|| ApiError::InvalidRequest("Missing userId".to_string()))
}

//! Payment intent creation and webhook endpoints.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use vpnshop_types::catalog::{self, PlanType};
use vpnshop_types::webhook::GatewayNotification;

use crate::api::AppState;
use crate::error::ApiError;
use crate::gateway::PlanTerms;
use crate::reconcile::ReconcileAck;
use crate::signature::{SIGNATURE_HEADER, verify_signature};

const GIB: u64 = 1024 * 1024 * 1024;

/// `POST /api/payment/create` body. Callers either name a catalog tariff
/// (`tariffId`) or pass the plan terms explicitly; both shapes are live
/// across the UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentBody {
    pub user_id: Option<i64>,
    pub tariff_id: Option<String>,
    pub plan_type: Option<PlanType>,
    pub days: Option<u32>,
    /// Price in major units (rubles), as the UI sends it.
    pub price: Option<f64>,
    /// Traffic cap in GiB; absent means unlimited.
    pub traffic_gb: Option<u64>,
    pub max_ips: Option<u32>,
}

/// Response to the caller once the gateway accepted the intent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreatedResponse {
    pub payment_id: String,
    pub confirmation_url: Option<String>,
    pub status: String,
}

/// Resolve the request into a user id and concrete plan terms.
pub fn resolve_terms(body: &CreatePaymentBody) -> Result<(i64, PlanTerms), ApiError> {
    let user_id = body
        .user_id
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::InvalidRequest("userId is required".to_string()))?;

    if let Some(tariff_id) = body.tariff_id.as_deref() {
        let plan = catalog::lookup_tariff_id(tariff_id).ok_or_else(|| {
            ApiError::InvalidRequest(format!("unknown tariffId: {tariff_id}"))
        })?;
        return Ok((user_id, PlanTerms::from(plan)));
    }

    let (Some(plan_type), Some(days), Some(price)) = (body.plan_type, body.days, body.price) else {
        return Err(ApiError::InvalidRequest(
            "userId, planType, days and price are required".to_string(),
        ));
    };
    if !(price > 0.0) || days == 0 {
        return Err(ApiError::InvalidRequest(
            "days and price must be positive".to_string(),
        ));
    }

    Ok((
        user_id,
        PlanTerms {
            plan_type,
            days,
            price_minor: (price * 100.0).round() as u64,
            // Absent trafficGb means unlimited (the 0 sentinel).
            traffic_limit_bytes: body.traffic_gb.map(|gb| gb * GIB).unwrap_or(0),
            device_limit: body.max_ips.unwrap_or(2),
        },
    ))
}

/// POST /api/payment/create - Create a payment intent at the gateway.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(body): Json<CreatePaymentBody>,
) -> Result<Json<PaymentCreatedResponse>, ApiError> {
    let (user_id, terms) = resolve_terms(&body)?;

    let created = state
        .gateway
        .create_payment(user_id, &terms, &state.config.return_url)
        .await?;

    Ok(Json(PaymentCreatedResponse {
        confirmation_url: created.confirmation_url().map(str::to_string),
        payment_id: created.id,
        status: created.status,
    }))
}

/// POST /api/payment/webhook - Reconcile a payment notification.
///
/// Always answers HTTP 200: a non-2xx here would make the gateway
/// retry-storm the endpoint while its downstream is failing.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if let Some(secret) = state.config.gateway.webhook_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if !verify_signature(&body, signature, secret) {
            warn!("webhook signature verification failed");
            return (
                StatusCode::OK,
                Json(ReconcileAck {
                    status: "error",
                    message: Some("invalid signature".to_string()),
                }),
            );
        }
    }

    let notification: GatewayNotification = match serde_json::from_slice(&body) {
        Ok(notification) => notification,
        Err(err) => {
            // A malformed body must not be retried indefinitely.
            error!("failed to parse webhook body: {}", err);
            return (
                StatusCode::OK,
                Json(ReconcileAck {
                    status: "error",
                    message: Some("malformed notification".to_string()),
                }),
            );
        }
    };

    let outcome = state.reconciler.process(notification).await;
    (StatusCode::OK, Json(outcome.ack()))
}

/// GET /api/payment/webhook - Liveness probe; gateways health-check webhook
/// endpoints with GET.
pub async fn webhook_probe() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "webhook endpoint active" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> CreatePaymentBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn explicit_terms_resolve() {
        let (user_id, terms) = resolve_terms(&body(
            r#"{"userId":123,"planType":"premium","days":90,"price":649}"#,
        ))
        .unwrap();
        assert_eq!(user_id, 123);
        assert_eq!(terms.plan_type, PlanType::Premium);
        assert_eq!(terms.days, 90);
        assert_eq!(terms.price_minor, 64_900);
        assert_eq!(terms.traffic_limit_bytes, 0);
        assert_eq!(terms.device_limit, 2);
    }

    #[test]
    fn traffic_gb_converts_to_bytes() {
        let (_, terms) = resolve_terms(&body(
            r#"{"userId":1,"planType":"personal","days":30,"price":199,"trafficGb":100,"maxIps":2}"#,
        ))
        .unwrap();
        assert_eq!(terms.traffic_limit_bytes, 107_374_182_400);
    }

    #[test]
    fn tariff_id_resolves_from_the_catalog() {
        let (_, terms) = resolve_terms(&body(r#"{"userId":7,"tariffId":"family_365"}"#)).unwrap();
        assert_eq!(terms.plan_type, PlanType::Family);
        assert_eq!(terms.days, 365);
        assert_eq!(terms.device_limit, 5);
    }

    #[test]
    fn missing_user_id_is_rejected() {
        let err = resolve_terms(&body(r#"{"planType":"premium","days":90,"price":649}"#));
        assert!(matches!(err, Err(ApiError::InvalidRequest(_))));

        let err = resolve_terms(&body(
            r#"{"userId":0,"planType":"premium","days":90,"price":649}"#,
        ));
        assert!(matches!(err, Err(ApiError::InvalidRequest(_))));
    }

    #[test]
    fn unresolvable_plan_is_rejected() {
        let err = resolve_terms(&body(r#"{"userId":1,"tariffId":"gold_90"}"#));
        assert!(matches!(err, Err(ApiError::InvalidRequest(_))));

        // Explicit shape with a field missing.
        let err = resolve_terms(&body(r#"{"userId":1,"planType":"premium","days":90}"#));
        assert!(matches!(err, Err(ApiError::InvalidRequest(_))));
    }
}

//! Outbound client for the payment gateway's payments API.

use uuid::Uuid;
use vpnshop_types::catalog::{Plan, PlanType};
use vpnshop_types::gateway::{
    Amount, Confirmation, CreatePaymentRequest, GatewayErrorBody, IntentMetadata, PaymentCreated,
};

use crate::config::GatewayConfig;

/// Brand prefix on payment descriptions, shown on the gateway's checkout page.
const DESCRIPTION_BRAND: &str = "Nyxion VPN";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The gateway answered with a non-2xx status and a human-readable
    /// description.
    #[error("gateway rejected payment ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("gateway transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned a malformed response: {0}")]
    MalformedResponse(#[source] reqwest::Error),
}

/// Plan terms a payment intent is created for, either resolved from the
/// catalog or passed explicitly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanTerms {
    pub plan_type: PlanType,
    pub days: u32,
    pub price_minor: u64,
    pub traffic_limit_bytes: u64,
    pub device_limit: u32,
}

impl From<&Plan> for PlanTerms {
    fn from(plan: &Plan) -> Self {
        PlanTerms {
            plan_type: plan.plan_type,
            days: plan.duration_days,
            price_minor: plan.price_minor,
            traffic_limit_bytes: plan.traffic_limit_bytes,
            device_limit: plan.device_limit,
        }
    }
}

/// Human-readable period for the payment description.
fn period_name(days: u32) -> &'static str {
    if days >= 365 {
        "1 год"
    } else if days >= 180 {
        "6 месяцев"
    } else if days >= 90 {
        "3 месяца"
    } else {
        "1 месяц"
    }
}

/// Build the gateway request for one payment attempt.
///
/// Every call mints a fresh idempotence key: the gateway treats the key as a
/// dedup token for that exact request body, so a legitimate repeat purchase
/// must never reuse one.
pub fn build_payment_request(
    user_id: i64,
    terms: &PlanTerms,
    return_url: &url::Url,
    currency: &str,
) -> (CreatePaymentRequest, Uuid) {
    let idempotence_key = Uuid::new_v4();

    let mut return_url = return_url.clone();
    return_url
        .query_pairs_mut()
        .append_pair("userId", &user_id.to_string());

    let request = CreatePaymentRequest {
        amount: Amount::from_minor(terms.price_minor, currency),
        capture: true,
        confirmation: Confirmation {
            confirmation_type: "redirect".to_string(),
            return_url: Some(return_url.to_string()),
            confirmation_url: None,
        },
        description: format!(
            "{}: {} ({})",
            DESCRIPTION_BRAND,
            terms.plan_type.display_name(),
            period_name(terms.days)
        ),
        metadata: IntentMetadata {
            user_id: user_id.to_string(),
            tariff_type: terms.plan_type,
            days: terms.days,
            traffic_limit: terms.traffic_limit_bytes,
            device_limit: terms.device_limit,
            price: terms.price_minor,
        },
    };

    (request, idempotence_key)
}

/// HTTP client for the gateway. Cheap to clone, shares the underlying pool.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(http: reqwest::Client, config: GatewayConfig) -> Self {
        GatewayClient { http, config }
    }

    /// Submit a payment intent. One outbound call, no local persistence;
    /// the gateway is the system of record during the pending window.
    pub async fn create_payment(
        &self,
        user_id: i64,
        terms: &PlanTerms,
        return_url: &url::Url,
    ) -> Result<PaymentCreated, GatewayError> {
        let (request, idempotence_key) =
            build_payment_request(user_id, terms, return_url, &self.config.currency);

        let response = self
            .http
            .post(self.config.api_url.clone())
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .header("Idempotence-Key", idempotence_key.to_string())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<GatewayErrorBody>()
                .await
                .ok()
                .and_then(|body| body.description)
                .unwrap_or_else(|| "Payment creation failed".to_string());
            tracing::warn!(status = status.as_u16(), "gateway rejected payment: {}", message);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<PaymentCreated>()
            .await
            .map_err(GatewayError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn premium_90() -> PlanTerms {
        PlanTerms {
            plan_type: PlanType::Premium,
            days: 90,
            price_minor: 64_900,
            traffic_limit_bytes: 0,
            device_limit: 2,
        }
    }

    fn return_url() -> url::Url {
        url::Url::parse("https://app.example.com/payment/success").unwrap()
    }

    #[test]
    fn request_embeds_stringified_user_id() {
        let (request, _) = build_payment_request(123, &premium_90(), &return_url(), "RUB");
        assert_eq!(request.metadata.user_id, "123");
        assert_eq!(request.metadata.tariff_type, PlanType::Premium);
        assert_eq!(request.metadata.days, 90);
        assert_eq!(request.metadata.traffic_limit, 0);
        assert_eq!(request.metadata.device_limit, 2);
    }

    #[test]
    fn amount_is_two_decimal_fixed() {
        let (request, _) = build_payment_request(123, &premium_90(), &return_url(), "RUB");
        assert_eq!(request.amount.value, "649.00");
        assert_eq!(request.amount.currency, "RUB");
        assert!(request.capture);
    }

    #[test]
    fn return_url_carries_user_id_for_polling() {
        let (request, _) = build_payment_request(123, &premium_90(), &return_url(), "RUB");
        let return_url = request.confirmation.return_url.unwrap();
        assert!(return_url.contains("userId=123"), "{return_url}");
    }

    #[test]
    fn identical_calls_mint_distinct_idempotence_keys() {
        let (_, first) = build_payment_request(123, &premium_90(), &return_url(), "RUB");
        let (_, second) = build_payment_request(123, &premium_90(), &return_url(), "RUB");
        assert_ne!(first, second);
    }

    #[test]
    fn description_names_tariff_and_period() {
        let (request, _) = build_payment_request(123, &premium_90(), &return_url(), "RUB");
        assert_eq!(request.description, "Nyxion VPN: Премиум (3 месяца)");

        let yearly = PlanTerms {
            days: 365,
            ..premium_90()
        };
        let (request, _) = build_payment_request(123, &yearly, &return_url(), "RUB");
        assert!(request.description.ends_with("(1 год)"));
    }
}

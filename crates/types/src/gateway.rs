//! Wire types for the payment gateway's payments API.

use serde::{Deserialize, Serialize};

use crate::catalog::PlanType;

/// Monetary amount as the gateway expects it: a fixed two-decimal string
/// plus an ISO currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: String,
    pub currency: String,
}

impl Amount {
    /// Format minor units (kopecks) as the gateway's `"X.XX"` string.
    pub fn from_minor(price_minor: u64, currency: &str) -> Self {
        Amount {
            value: format!("{}.{:02}", price_minor / 100, price_minor % 100),
            currency: currency.to_string(),
        }
    }
}

/// Redirect confirmation: the gateway sends the payer to its own page and
/// returns them to `return_url` afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    #[serde(rename = "type")]
    pub confirmation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>,
}

/// Plan terms embedded into the payment at creation time. The webhook echoes
/// these back; they are the single source of truth for activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMetadata {
    /// Stringified, the gateway only round-trips string metadata reliably.
    pub user_id: String,
    pub tariff_type: PlanType,
    pub days: u32,
    /// Bytes, 0 = unlimited.
    pub traffic_limit: u64,
    pub device_limit: u32,
    /// Price in minor units.
    pub price: u64,
}

/// `POST /payments` request body.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentRequest {
    pub amount: Amount,
    /// Immediate settlement, no manual capture step.
    pub capture: bool,
    pub confirmation: Confirmation,
    pub description: String,
    pub metadata: IntentMetadata,
}

/// Gateway's response to a created payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCreated {
    pub id: String,
    pub status: String,
    pub confirmation: Option<Confirmation>,
}

impl PaymentCreated {
    pub fn confirmation_url(&self) -> Option<&str> {
        self.confirmation
            .as_ref()
            .and_then(|c| c.confirmation_url.as_deref())
    }
}

/// Error body the gateway returns on rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayErrorBody {
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_formats_two_decimals() {
        assert_eq!(Amount::from_minor(64_900, "RUB").value, "649.00");
        assert_eq!(Amount::from_minor(19_905, "RUB").value, "199.05");
        assert_eq!(Amount::from_minor(50, "RUB").value, "0.50");
    }

    #[test]
    fn metadata_serializes_with_gateway_key_names() {
        let metadata = IntentMetadata {
            user_id: "123".to_string(),
            tariff_type: PlanType::Premium,
            days: 90,
            traffic_limit: 0,
            device_limit: 2,
            price: 64_900,
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["userId"], "123");
        assert_eq!(json["tariffType"], "premium");
        assert_eq!(json["days"], 90);
        assert_eq!(json["trafficLimit"], 0);
        assert_eq!(json["deviceLimit"], 2);
    }

    #[test]
    fn payment_created_parses_confirmation_url() {
        let created: PaymentCreated = serde_json::from_str(
            r#"{"id":"pay_1","status":"pending","confirmation":{"type":"redirect","confirmation_url":"https://pay/x"}}"#,
        )
        .unwrap();
        assert_eq!(created.confirmation_url(), Some("https://pay/x"));
    }
}

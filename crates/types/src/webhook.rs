//! Webhook notification types and metadata normalization.
//!
//! Two generations of the intent creator embedded plan terms under different
//! metadata key sets. Both are modeled explicitly (`MetadataV1` /
//! `MetadataV2`) and normalized into one [`ActivationCommand`] instead of
//! falling back field by field at the call site.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::catalog::PlanType;
use crate::gateway::Amount;

/// Fallbacks applied when a metadata field is absent or unparseable.
pub const DEFAULT_DAYS: u32 = 30;
pub const DEFAULT_TRAFFIC_LIMIT: u64 = 0;
pub const DEFAULT_DEVICE_LIMIT: u32 = 2;
pub const DEFAULT_TARIFF: &str = "premium";

/// Asynchronous payment-status notification from the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayNotification {
    #[serde(rename = "type", default)]
    pub notification_type: Option<String>,
    pub event: String,
    pub object: PaymentObject,
}

/// The payment object nested in a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentObject {
    pub id: String,
    pub status: String,
    pub amount: Amount,
    #[serde(default)]
    pub metadata: Option<PaymentMetadata>,
    #[serde(default)]
    pub paid: bool,
}

/// Accept a metadata value as a string whether it arrived as a JSON string
/// or a number.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept a numeric metadata value whether it arrived as a JSON number or a
/// stringified number. Anything else degrades to `None`.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::Number(n)) => n.as_u64(),
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Current-generation metadata: the intent creator embeds the full plan
/// terms. Distinguished from V1 by the presence of the limit keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataV2 {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tariff_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub days: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub traffic_limit: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub device_limit: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub price: Option<u64>,
}

/// First-generation metadata: only the tariff is embedded, limits are
/// derived from the tariff tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataV1 {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tariff_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub days: Option<u64>,
    #[serde(default)]
    pub tariff_type: Option<String>,
}

/// Metadata echoed back by the gateway, either generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PaymentMetadata {
    V2(MetadataV2),
    V1(MetadataV1),
}

/// Outbound activation call to the backend VPS API, derived entirely from
/// webhook metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationCommand {
    pub user_id: i64,
    pub days: u32,
    pub tariff: String,
    pub traffic_limit: u64,
    pub device_limit: u32,
    pub payment_id: String,
    pub amount: String,
}

/// Metadata that cannot target an account. Terminal, never retried.
#[derive(Debug, Clone, thiserror::Error)]
#[error("metadata has no usable userId")]
pub struct MissingUserId;

impl PaymentMetadata {
    fn user_id(&self) -> Option<i64> {
        let raw = match self {
            PaymentMetadata::V2(m) => m.user_id.as_deref(),
            PaymentMetadata::V1(m) => m.user_id.as_deref(),
        };
        raw.and_then(|s| s.trim().parse().ok())
    }

    /// Normalize either metadata generation into an activation command.
    ///
    /// `user_id` is mandatory; every other field falls back to its
    /// documented default when absent or unparseable.
    pub fn to_activation(
        &self,
        payment_id: &str,
        amount: &Amount,
    ) -> Result<ActivationCommand, MissingUserId> {
        let user_id = self.user_id().ok_or(MissingUserId)?;

        let (tariff_raw, days) = match self {
            PaymentMetadata::V2(m) => (m.tariff_type.as_deref(), m.days),
            PaymentMetadata::V1(m) => (m.tariff_type.as_deref(), m.days),
        };
        let tariff = tariff_raw.unwrap_or(DEFAULT_TARIFF).to_string();
        let tier: PlanType = tariff.parse().unwrap_or(PlanType::Premium);

        let (traffic_limit, device_limit) = match self {
            PaymentMetadata::V2(m) => (
                m.traffic_limit.unwrap_or(DEFAULT_TRAFFIC_LIMIT),
                m.device_limit
                    .and_then(|d| u32::try_from(d).ok())
                    .unwrap_or(DEFAULT_DEVICE_LIMIT),
            ),
            // V1 never carried limits, derive them from the tier.
            PaymentMetadata::V1(_) => (tier.traffic_limit_bytes(), tier.device_limit()),
        };

        Ok(ActivationCommand {
            user_id,
            days: days
                .and_then(|d| u32::try_from(d).ok())
                .unwrap_or(DEFAULT_DAYS),
            tariff,
            traffic_limit,
            device_limit,
            payment_id: payment_id.to_string(),
            amount: amount.value.clone(),
        })
    }
}

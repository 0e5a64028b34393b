//! Static plan catalog.
//!
//! Plans are compile-time constants: prices (fiat and crypto) are refreshed
//! by redeploying the catalog, never computed at runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 100 GiB, the traffic cap on personal plans.
pub const PERSONAL_TRAFFIC_LIMIT_BYTES: u64 = 100 * 1024 * 1024 * 1024;

/// Purchasable plan tiers, ordered personal < premium < family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Personal,
    Premium,
    Family,
}

impl PlanType {
    /// Ordering rank used by the upgrade/downgrade policy.
    pub fn rank(&self) -> u8 {
        match self {
            PlanType::Personal => 1,
            PlanType::Premium => 2,
            PlanType::Family => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Personal => "personal",
            PlanType::Premium => "premium",
            PlanType::Family => "family",
        }
    }

    /// Display name used in payment descriptions.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanType::Personal => "Личный",
            PlanType::Premium => "Премиум",
            PlanType::Family => "Семейный",
        }
    }

    /// Traffic cap in bytes for this tier (0 = unlimited).
    pub fn traffic_limit_bytes(&self) -> u64 {
        match self {
            PlanType::Personal => PERSONAL_TRAFFIC_LIMIT_BYTES,
            PlanType::Premium | PlanType::Family => 0,
        }
    }

    /// Concurrent device cap for this tier.
    pub fn device_limit(&self) -> u32 {
        match self {
            PlanType::Personal | PlanType::Premium => 2,
            PlanType::Family => 5,
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(PlanType::Personal),
            "premium" => Ok(PlanType::Premium),
            "family" => Ok(PlanType::Family),
            other => Err(UnknownPlan(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown plan type: {0}")]
pub struct UnknownPlan(pub String);

/// Crypto assets with precomputed per-plan prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CryptoAsset {
    #[serde(rename = "USDT")]
    Usdt,
    #[serde(rename = "TON")]
    Ton,
    #[serde(rename = "BTC")]
    Btc,
}

impl CryptoAsset {
    pub fn as_str(&self) -> &'static str {
        match self {
            CryptoAsset::Usdt => "USDT",
            CryptoAsset::Ton => "TON",
            CryptoAsset::Btc => "BTC",
        }
    }
}

/// Immutable catalog entry for one plan type + duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub plan_type: PlanType,
    pub duration_days: u32,
    /// Price in minor currency units (kopecks).
    pub price_minor: u64,
    /// Static crypto-equivalent prices, decimal strings.
    pub usdt_price: &'static str,
    pub ton_price: &'static str,
    pub btc_price: &'static str,
    /// 0 means unlimited.
    pub traffic_limit_bytes: u64,
    pub device_limit: u32,
    pub discount_percent: Option<u8>,
}

impl Plan {
    const fn new(
        plan_type: PlanType,
        duration_days: u32,
        price_minor: u64,
        usdt_price: &'static str,
        ton_price: &'static str,
        btc_price: &'static str,
        traffic_limit_bytes: u64,
        device_limit: u32,
        discount_percent: Option<u8>,
    ) -> Self {
        Plan {
            plan_type,
            duration_days,
            price_minor,
            usdt_price,
            ton_price,
            btc_price,
            traffic_limit_bytes,
            device_limit,
            discount_percent,
        }
    }

    /// Precomputed crypto price for `asset`, as a decimal string.
    pub fn crypto_price(&self, asset: CryptoAsset) -> &'static str {
        match asset {
            CryptoAsset::Usdt => self.usdt_price,
            CryptoAsset::Ton => self.ton_price,
            CryptoAsset::Btc => self.btc_price,
        }
    }

    /// Tariff id of the form `"premium_90"`, accepted by the create endpoint.
    pub fn tariff_id(&self) -> String {
        format!("{}_{}", self.plan_type, self.duration_days)
    }
}

const GIB: u64 = 1024 * 1024 * 1024;

/// The full purchasable catalog.
pub static PLANS: &[Plan] = &[
    // Personal: 100 GiB cap, 2 devices.
    Plan::new(PlanType::Personal, 30, 19_900, "1.99", "3.98", "0.0000199", 100 * GIB, 2, None),
    Plan::new(PlanType::Personal, 90, 49_900, "4.99", "9.98", "0.0000499", 100 * GIB, 2, Some(16)),
    Plan::new(PlanType::Personal, 180, 89_900, "8.99", "17.98", "0.0000899", 100 * GIB, 2, Some(25)),
    Plan::new(PlanType::Personal, 365, 149_900, "14.99", "29.98", "0.0001499", 100 * GIB, 2, Some(38)),
    // Premium: unlimited traffic, 2 devices.
    Plan::new(PlanType::Premium, 30, 24_900, "2.49", "4.98", "0.0000249", 0, 2, None),
    Plan::new(PlanType::Premium, 90, 64_900, "6.49", "12.98", "0.0000649", 0, 2, Some(13)),
    Plan::new(PlanType::Premium, 180, 119_900, "11.99", "23.98", "0.0001199", 0, 2, Some(20)),
    Plan::new(PlanType::Premium, 365, 199_900, "19.99", "39.98", "0.0001999", 0, 2, Some(33)),
    // Family: unlimited traffic, 5 devices.
    Plan::new(PlanType::Family, 30, 39_900, "3.99", "7.98", "0.0000399", 0, 5, None),
    Plan::new(PlanType::Family, 90, 99_900, "9.99", "19.98", "0.0000999", 0, 5, Some(17)),
    Plan::new(PlanType::Family, 180, 189_900, "18.99", "37.98", "0.0001899", 0, 5, Some(21)),
    Plan::new(PlanType::Family, 365, 319_900, "31.99", "63.98", "0.0003199", 0, 5, Some(33)),
];

/// Look up a plan by type and duration.
pub fn lookup(plan_type: PlanType, duration_days: u32) -> Option<&'static Plan> {
    PLANS
        .iter()
        .find(|p| p.plan_type == plan_type && p.duration_days == duration_days)
}

/// Resolve a `"<type>_<days>"` tariff id (e.g. `"premium_90"`).
pub fn lookup_tariff_id(tariff_id: &str) -> Option<&'static Plan> {
    let (type_part, days_part) = tariff_id.split_once('_')?;
    let plan_type = type_part.parse().ok()?;
    let duration_days: u32 = days_part.parse().ok()?;
    lookup(plan_type, duration_days)
}

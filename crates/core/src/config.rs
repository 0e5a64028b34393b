//! Server configuration, sourced from the environment.

use std::env;

use url::Url;

/// Timeout applied to every outbound call (gateway and backend). An
/// unbounded hang would block the caller's browser or the webhook
/// acknowledgment.
pub const OUTBOUND_TIMEOUT_SECS: u64 = 10;

pub const GATEWAY_URL_ENV: &str = "VPNSHOP_GATEWAY_URL";
pub const GATEWAY_SHOP_ID_ENV: &str = "VPNSHOP_GATEWAY_SHOP_ID";
pub const GATEWAY_SECRET_ENV: &str = "VPNSHOP_GATEWAY_SECRET";
pub const GATEWAY_WEBHOOK_SECRET_ENV: &str = "VPNSHOP_GATEWAY_WEBHOOK_SECRET";
pub const BACKEND_URL_ENV: &str = "VPNSHOP_BACKEND_URL";
pub const RETURN_URL_ENV: &str = "VPNSHOP_RETURN_URL";

pub const DEFAULT_GATEWAY_URL: &str = "https://api.yookassa.ru/v3/payments";
pub const DEFAULT_CURRENCY: &str = "RUB";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid URL in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Credentials and endpoint for the payment gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_url: Url,
    pub shop_id: String,
    pub secret_key: String,
    /// HMAC secret for webhook signature verification. `None` disables
    /// verification (deployments relying on the gateway's IP allow-list).
    pub webhook_secret: Option<String>,
    pub currency: String,
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub gateway: GatewayConfig,
    /// Base URL of the VPS backend API.
    pub backend_url: Url,
    /// Where the gateway redirects the payer after checkout; `userId` is
    /// appended as a query parameter so the return page can poll.
    pub return_url: Url,
}

impl ServerConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_url_var(GATEWAY_URL_ENV, Some(DEFAULT_GATEWAY_URL))?;
        let backend_url = parse_url_var(BACKEND_URL_ENV, None)?;
        let return_url = parse_url_var(RETURN_URL_ENV, None)?;

        let webhook_secret = env::var(GATEWAY_WEBHOOK_SECRET_ENV)
            .ok()
            .filter(|s| !s.is_empty());

        Ok(ServerConfig {
            gateway: GatewayConfig {
                api_url,
                shop_id: require_var(GATEWAY_SHOP_ID_ENV)?,
                secret_key: require_var(GATEWAY_SECRET_ENV)?,
                webhook_secret,
                currency: DEFAULT_CURRENCY.to_string(),
            },
            backend_url,
            return_url,
        })
    }
}

fn require_var(var: &'static str) -> Result<String, ConfigError> {
    env::var(var)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}

fn parse_url_var(var: &'static str, default: Option<&str>) -> Result<Url, ConfigError> {
    let raw = match env::var(var) {
        Ok(value) if !value.is_empty() => value,
        _ => match default {
            Some(value) => value.to_string(),
            None => return Err(ConfigError::MissingVar(var)),
        },
    };
    Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { var, source })
}

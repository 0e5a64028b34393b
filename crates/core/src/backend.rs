//! Client for the external backend VPS API.
//!
//! The backend owns key issuance, device limits and traffic accounting;
//! this side only forwards requests and reads back JSON verbatim.

use std::future::Future;

use axum::http::StatusCode;
use serde_json::{Value as JsonValue, json};
use url::Url;
use vpnshop_types::webhook::ActivationCommand;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned a malformed response: {0}")]
    MalformedResponse(#[source] reqwest::Error),

    #[error("activation rejected ({status}): {message}")]
    ActivationRejected { status: u16, message: String },
}

/// A backend response forwarded to the caller as-is: the backend's status
/// code and JSON body pass through untouched.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub body: JsonValue,
}

/// The activation seam the webhook reconciler drives. Kept as a trait so
/// tests can count and capture activation calls.
pub trait Activator: Send + Sync {
    fn activate(
        &self,
        command: &ActivationCommand,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// HTTP client for the VPS API. Cheap to clone.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        BackendClient { http, base_url }
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    async fn forward(&self, response: reqwest::Response) -> Result<ProxyResponse, BackendError> {
        let status = response.status();
        let body = response
            .json::<JsonValue>()
            .await
            .map_err(BackendError::MalformedResponse)?;
        Ok(ProxyResponse { status, body })
    }

    /// `GET /api/subscription?userId=&deviceId=`
    pub async fn get_subscription(
        &self,
        user_id: i64,
        device_id: Option<&str>,
    ) -> Result<ProxyResponse, BackendError> {
        let mut url = self.endpoint("/api/subscription");
        url.query_pairs_mut()
            .append_pair("userId", &user_id.to_string());
        if let Some(device_id) = device_id {
            url.query_pairs_mut().append_pair("deviceId", device_id);
        }
        let response = self.http.get(url).send().await?;
        self.forward(response).await
    }

    /// `GET /api/devices?userId=`
    pub async fn get_devices(&self, user_id: i64) -> Result<ProxyResponse, BackendError> {
        let mut url = self.endpoint("/api/devices");
        url.query_pairs_mut()
            .append_pair("userId", &user_id.to_string());
        let response = self.http.get(url).send().await?;
        self.forward(response).await
    }

    /// `DELETE /api/devices {userId, deviceId}`
    pub async fn delete_device(
        &self,
        user_id: i64,
        device_id: &str,
    ) -> Result<ProxyResponse, BackendError> {
        let response = self
            .http
            .delete(self.endpoint("/api/devices"))
            .json(&json!({ "userId": user_id, "deviceId": device_id }))
            .send()
            .await?;
        self.forward(response).await
    }

    /// `POST /api/activate-promo {userId, promoCode}`
    pub async fn activate_promo(
        &self,
        user_id: i64,
        promo_code: &str,
    ) -> Result<ProxyResponse, BackendError> {
        let response = self
            .http
            .post(self.endpoint("/api/activate-promo"))
            .json(&json!({ "userId": user_id, "promoCode": promo_code }))
            .send()
            .await?;
        self.forward(response).await
    }

    /// `POST /api/create-invoice {userId, method, asset, amount}` — the
    /// crypto payment path, separate from the gateway flow.
    pub async fn create_invoice(
        &self,
        user_id: i64,
        method: &str,
        asset: &str,
        amount: f64,
    ) -> Result<ProxyResponse, BackendError> {
        let response = self
            .http
            .post(self.endpoint("/api/create-invoice"))
            .json(&json!({
                "userId": user_id,
                "method": method,
                "asset": asset,
                "amount": amount,
            }))
            .send()
            .await?;
        self.forward(response).await
    }
}

impl Activator for BackendClient {
    /// `POST /api/activate` — extend/grant the user's subscription terms.
    fn activate(
        &self,
        command: &ActivationCommand,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        let request = self
            .http
            .post(self.endpoint("/api/activate"))
            .json(command);
        async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(BackendError::ActivationRejected {
                    status: status.as_u16(),
                    message,
                });
            }
            Ok(())
        }
    }
}

pub mod payment;
pub mod proxy;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::BackendClient;
use crate::config::{OUTBOUND_TIMEOUT_SECS, ServerConfig};
use crate::gateway::GatewayClient;
use crate::reconcile::Reconciler;

/// Application state shared by all handlers. Stateless per request apart
/// from the reconciler's idempotency ledger.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub gateway: GatewayClient,
    pub backend: BackendClient,
    pub reconciler: Arc<Reconciler<BackendClient>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(OUTBOUND_TIMEOUT_SECS))
            .build()?;

        let backend = BackendClient::new(http.clone(), config.backend_url.clone());
        Ok(AppState {
            gateway: GatewayClient::new(http, config.gateway.clone()),
            reconciler: Arc::new(Reconciler::new(backend.clone())),
            backend,
            config: Arc::new(config),
        })
    }
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Create the storefront router with all routes.
pub fn create_router(state: AppState) -> Router<()> {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Backend proxy endpoints
        .route("/api/subscription", get(proxy::get_subscription))
        .route(
            "/api/devices",
            get(proxy::get_devices).delete(proxy::delete_device),
        )
        .route("/api/activate-promo", post(proxy::activate_promo))
        .route("/api/create-invoice", post(proxy::create_invoice))
        // Payment gateway endpoints
        .route("/api/payment/create", post(payment::create_payment))
        .route(
            "/api/payment/webhook",
            post(payment::webhook).get(payment::webhook_probe),
        )
        .with_state(state)
        .layer(cors_layer)
}

/// Start the API server on the specified port.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config)?;
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Starting storefront API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

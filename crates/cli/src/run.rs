use vpnshop_core::api;
use vpnshop_core::config::ServerConfig;

#[derive(Debug, Clone, PartialEq, clap::Args)]
pub struct RunCommand {
    /// Port to run the server on
    #[arg(long, env = "VPNSHOP_PORT", default_value = "3000")]
    pub port: u16,
}

impl RunCommand {
    pub async fn execute(&self) -> Result<(), String> {
        tracing_subscriber::fmt::init();

        let config = ServerConfig::from_env().map_err(|e| e.to_string())?;

        tracing::info!(
            backend = %config.backend_url,
            gateway = %config.gateway.api_url,
            webhook_verification = config.gateway.webhook_secret.is_some(),
            "configuration loaded"
        );

        api::start_server(config, self.port)
            .await
            .map_err(|e| e.to_string())
    }
}

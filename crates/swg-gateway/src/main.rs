//! OpenSASE SWG - Main Entry Point

use std::sync::Arc;
use swg_gateway::{AppState, GatewayConfig, SecureWebGateway};
use swg_gateway::config::DEFAULT_CONFIG_PATH;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("OpenSASE SWG v{}", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = std::env::var("CONFIG_PATH")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = GatewayConfig::load_or_default(&config_path)?;

    // Build pipeline
    let gateway = Arc::new(SecureWebGateway::from_config(&config)?);
    tracing::info!(
        policy_version = gateway.policy_version(),
        override_mode = ?config.allow_all_override,
        "Gateway ready"
    );

    // Run
    let addr = config.listen_addr;
    swg_gateway::serve(addr, Arc::new(AppState::new(gateway, config))).await?;

    Ok(())
}

//! OpenSASE Secure Web Gateway
//!
//! Inline allow/block decisions for outbound web requests, combining:
//! - Destination reputation and URL categories
//! - Zero Trust identity and device posture
//! - Payload DLP
//! - CASB app detection and forbidden-activity rules
//!
//! plus a small control API for checks, policy reloads and recent audit
//! records.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod pipeline;
pub mod sink;
pub mod tls;

pub use config::{AllowAllOverride, GatewayConfig};
pub use pipeline::{GatewayStats, GatewayVerdict, SecureWebGateway};
pub use sink::{AuditSink, JsonlFileSink, MemorySink, SinkError};

use axum::{routing::get, routing::post, Extension, Router};
use std::net::SocketAddr;
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    /// Enforcement pipeline
    pub gateway: Arc<SecureWebGateway>,
    /// Configuration the gateway was built from
    pub config: GatewayConfig,
}

impl AppState {
    /// Create application state
    pub fn new(gateway: Arc<SecureWebGateway>, config: GatewayConfig) -> Self {
        Self { gateway, config }
    }
}

/// Build the API router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/status", get(handlers::status))

        // Metrics
        .route("/metrics", get(handlers::metrics))

        // Enforcement
        .route("/api/v1/check", post(handlers::check))

        // Policy
        .route("/api/v1/policy/reload", post(handlers::policy_reload))
        .route("/api/v1/token/verify", post(handlers::token_verify))

        // Audit
        .route("/api/v1/logs", get(handlers::logs))

        // Add state
        .layer(Extension(state))
}

/// Start the gateway server
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<(), std::io::Error> {
    let app = build_router(state);

    tracing::info!("OpenSASE SWG listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

//! HTTP transport: MCP over `POST /mcp`.

pub mod api;

use crate::mcp::McpServer;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Maximum accepted request body (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub server: Arc<McpServer>,
    pub bearer_token: Option<String>,
}

impl AppState {
    pub fn new(server: Arc<McpServer>, bearer_token: Option<String>) -> Self {
        Self {
            server,
            bearer_token: bearer_token.filter(|t| !t.trim().is_empty()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(api::handle_mcp))
        .route("/health", get(api::handle_health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn run_gateway(host: &str, port: u16, state: AppState) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind gateway on {addr}"))?;
    let local = listener.local_addr().context("Failed to read bound address")?;

    tracing::info!(
        addr = %local,
        auth = state.bearer_token.is_some(),
        "Toggl MCP gateway listening"
    );
    if state.bearer_token.is_none() && !local.ip().is_loopback() {
        tracing::warn!("Gateway is reachable beyond loopback without a bearer token");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down gateway");
        })
        .await
        .context("Gateway server error")
}

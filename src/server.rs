//! Server initialization for stdio (MCP) and HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that build the
//! configured backend and wire it into a running server.

use crate::api::{self, AppState};
use crate::backend;
use crate::config::SaachiConfig;
use crate::pipeline::Companion;
use crate::tools::SaachiTools;
use anyhow::{Context, Result};
use rmcp::ServiceExt;
use std::sync::Arc;

/// Shared setup: create the backend selected by config and wrap it in the
/// companion pipeline.
pub fn build_companion(config: &SaachiConfig) -> Result<Companion> {
    let backend = backend::create_backend(&config.backend)?;
    tracing::info!(
        provider = %config.backend.provider,
        model = %config.backend.model,
        "backend ready"
    );
    Ok(Companion::new(Arc::from(backend)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: SaachiConfig) -> Result<()> {
    tracing::info!("starting Saachi MCP server on stdio");

    let companion = build_companion(&config)?;

    let tools = SaachiTools::new(companion);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the HTTP server: action and session routes plus MCP over
/// Streamable HTTP at `/mcp`.
pub async fn serve_http(config: SaachiConfig) -> Result<()> {
    let bind_addr = config.bind_addr();

    tracing::info!(addr = %bind_addr, "starting Saachi HTTP server");

    let companion = build_companion(&config)?;
    let mcp_companion = companion.clone();

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(SaachiTools::new(mcp_companion.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = api::router(AppState::new(companion)).nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP server to {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}

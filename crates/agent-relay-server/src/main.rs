//! Agent relay server.
//!
//! Run with: cargo run -p agent-relay-server
//!
//! Then open http://localhost:8000 in your browser.

mod config;

use std::sync::Arc;

use agent_relay_core::{AgentOptions, Relay, SettingsProfile};
use agent_relay_executor::ClaudeRuntime;
use agent_relay_transport::{AppState, create_router};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let runtime = Arc::new(ClaudeRuntime::new(
        config.claude_command.clone(),
        config.working_dir.clone(),
    ));
    let relay = Relay::new(runtime, AgentOptions::default());
    tracing::info!(
        profile = ?SettingsProfile::ACTIVE,
        settings = SettingsProfile::ACTIVE.path(),
        working_dir = %config.working_dir.display(),
        "Agent configured"
    );

    let app = create_router(AppState::new(Arc::clone(&relay), config.index_path.clone()));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!("Server listening on http://{}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release the live agent process, if any.
    relay.reset().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

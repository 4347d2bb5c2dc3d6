//! Router for the browser-facing routes.

use std::{path::PathBuf, sync::Arc};

use agent_relay_core::Relay;
use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    /// Browser UI document served at `/`.
    pub index_path: Arc<PathBuf>,
}

impl AppState {
    /// Create new state.
    #[must_use]
    pub fn new(relay: Arc<Relay>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            relay,
            index_path: Arc::new(index_path.into()),
        }
    }
}

/// Create the relay router.
///
/// # Example
/// ```ignore
/// let relay = Relay::new(runtime, AgentOptions::default());
/// let app = create_router(AppState::new(relay, "index.html"));
/// axum::serve(listener, app).await?;
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/reset", post(handlers::reset))
        .route("/interrupt", post(handlers::interrupt))
        .route("/chat", post(handlers::chat))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

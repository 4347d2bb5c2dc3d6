//! Route handlers.

use agent_relay_core::RelayError;
use axum::{
    Json,
    extract::State,
    response::{
        Html,
        sse::{Event, Sse},
    },
};
use futures::{Stream, StreamExt};

use crate::{
    AppState, TransportError,
    protocol::{ChatRequest, InterruptResponse, ResetResponse},
};

/// `GET /`: the browser UI, read from disk unmodified.
///
/// # Errors
/// Returns error if the document cannot be read.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, TransportError> {
    let path = state.index_path.as_ref();
    let html = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TransportError::Index {
            path: path.clone(),
            source,
        })?;
    Ok(Html(html))
}

/// `POST /reset`: drop the session and report which one was cleared.
pub async fn reset(State(state): State<AppState>) -> Json<ResetResponse> {
    Json(ResetResponse::ok(state.relay.reset().await))
}

/// `POST /interrupt`: stop the in-flight generation, if any.
pub async fn interrupt(State(state): State<AppState>) -> Json<InterruptResponse> {
    Json(InterruptResponse::ok(state.relay.interrupt().await))
}

/// `POST /chat`: stream one exchange as server-sent events.
///
/// A failed exchange aborts the body without the `[DONE]` frame.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, RelayError>>> {
    tracing::info!(prompt_len = request.message.len(), "Chat request");
    let events = state
        .relay
        .chat(request.message)
        .map(|item| item.map(|event| event.to_sse_event()));
    Sse::new(events)
}

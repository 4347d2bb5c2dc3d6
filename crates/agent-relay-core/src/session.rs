//! The relay's single conversation slot.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::AgentConnection;

#[derive(Default)]
struct SessionState {
    session_id: Option<String>,
    connection: Option<Arc<dyn AgentConnection>>,
}

/// Holds the one active conversation: its resume token and live connection.
///
/// The lock is only held for the duration of each operation, never across
/// an exchange, so concurrent chats interleave with last-writer-wins
/// semantics.
#[derive(Default)]
pub struct SessionSlot {
    state: Mutex<SessionState>,
}

impl SessionSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume token to attach to the next prompt.
    pub async fn resolve(&self) -> Option<String> {
        self.state.lock().await.session_id.clone()
    }

    /// Whether a live connection is held.
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.connection.is_some()
    }

    /// Store the live connection for the current exchange.
    ///
    /// A previously held connection is released once nothing else uses it.
    pub async fn install(&self, connection: Arc<dyn AgentConnection>) {
        let previous = self.state.lock().await.connection.replace(connection);
        if previous.is_some() {
            tracing::debug!("Replacing live agent connection");
        }
    }

    /// Close the live connection and forget the session.
    ///
    /// Returns the token that was cleared. Resetting an empty slot is fine.
    pub async fn reset(&self) -> Option<String> {
        let (connection, cleared) = {
            let mut state = self.state.lock().await;
            (state.connection.take(), state.session_id.take())
        };

        if let Some(connection) = connection {
            if let Err(e) = connection.disconnect().await {
                tracing::warn!("Failed to disconnect agent: {e}");
            }
        }

        tracing::info!(cleared_session = ?cleared, "Session reset");
        cleared
    }

    /// Ask the live connection to stop generating.
    ///
    /// Returns `false` when there is nothing to interrupt or the request failed.
    pub async fn interrupt(&self) -> bool {
        let Some(connection) = self.state.lock().await.connection.clone() else {
            return false;
        };

        match connection.interrupt().await {
            Ok(()) => {
                tracing::info!("Interrupted agent");
                true
            }
            Err(e) => {
                tracing::warn!("Failed to interrupt agent: {e}");
                false
            }
        }
    }

    /// Record the session id from an init notice.
    ///
    /// Returns whether the stored token changed.
    pub async fn observe_init(&self, candidate: Option<&str>) -> bool {
        let Some(candidate) = candidate.filter(|id| !id.is_empty()) else {
            return false;
        };

        let mut state = self.state.lock().await;
        if state.session_id.as_deref() == Some(candidate) {
            return false;
        }
        tracing::info!(session_id = candidate, "Agent session started");
        state.session_id = Some(candidate.to_string());
        true
    }
}

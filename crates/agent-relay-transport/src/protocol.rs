//! Wire types for the JSON endpoints.

use serde::{Deserialize, Serialize};

const STATUS_OK: &str = "ok";

/// Body of `POST /chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Prompt text, forwarded unchanged. Missing means empty.
    #[serde(default)]
    pub message: String,
}

/// Response of `POST /reset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
    /// Session token that was current before the reset.
    pub cleared_session: Option<String>,
}

impl ResetResponse {
    #[must_use]
    pub fn ok(cleared_session: Option<String>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            cleared_session,
        }
    }
}

/// Response of `POST /interrupt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptResponse {
    pub status: String,
    pub interrupted: bool,
}

impl InterruptResponse {
    #[must_use]
    pub fn ok(interrupted: bool) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            interrupted,
        }
    }
}

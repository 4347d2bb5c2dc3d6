//! Outbound events and their server-push framing.

use std::fmt::Debug;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;
use serde_json::Value;

/// Literal payload of the final frame of every stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Notice sent when an exchange produced no visible text.
pub const NO_TEXT_NOTICE: &str = "[Agent completed without text response]";

/// Permission-related system notices forwarded to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Request,
    Denied,
    ToolBlocked,
}

impl PermissionStatus {
    /// Wire subtype name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "permission_request",
            Self::Denied => "permission_denied",
            Self::ToolBlocked => "tool_blocked",
        }
    }
}

/// A single unit of server-push output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Assistant text, verbatim.
    Text(String),
    /// The agent invoked a tool. `encoded_input` is base64 of the JSON input.
    ToolUse { name: String, encoded_input: String },
    /// Permission status change.
    Permission(PermissionStatus),
    /// The exchange finished without any visible text.
    NoTextResponse,
    /// End of stream.
    Done,
}

impl OutboundEvent {
    /// Create a tool notice, encoding `input` for transport.
    #[must_use]
    pub fn tool_use<T>(name: impl Into<String>, input: &T) -> Self
    where
        T: Serialize + Debug + ?Sized,
    {
        Self::ToolUse {
            name: name.into(),
            encoded_input: encode_tool_input(input),
        }
    }

    /// Text carried by this event.
    #[must_use]
    pub fn payload(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::ToolUse {
                name,
                encoded_input,
            } => format!("[Using {name}|{encoded_input}]"),
            Self::Permission(status) => format!("[Permission: {}]", status.as_str()),
            Self::NoTextResponse => NO_TEXT_NOTICE.to_string(),
            Self::Done => DONE_SENTINEL.to_string(),
        }
    }

    /// Frame data: the payload as a JSON string, or the bare sentinel.
    #[must_use]
    pub fn frame_data(&self) -> String {
        match self {
            Self::Done => DONE_SENTINEL.to_string(),
            other => Value::String(other.payload()).to_string(),
        }
    }

    /// Complete SSE frame, `data: <data>\n\n`.
    #[must_use]
    pub fn to_frame(&self) -> String {
        format!("data: {}\n\n", self.frame_data())
    }

    /// SSE event (requires `sse` feature).
    #[cfg(feature = "sse")]
    #[must_use]
    pub fn to_sse_event(&self) -> axum::response::sse::Event {
        axum::response::sse::Event::default().data(self.frame_data())
    }
}

/// Serialize a tool input to JSON and base64 it.
///
/// Never fails: input that cannot be serialized falls back to its debug
/// rendering.
#[must_use]
pub fn encode_tool_input<T>(input: &T) -> String
where
    T: Serialize + Debug + ?Sized,
{
    let rendered = serde_json::to_string(input).unwrap_or_else(|e| {
        tracing::debug!("Tool input not serializable, using debug rendering: {e}");
        format!("{input:?}")
    });
    BASE64.encode(rendered.as_bytes())
}

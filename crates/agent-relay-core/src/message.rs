//! Messages produced by the agent runtime.

use serde_json::Value;

/// A message received from the agent runtime during one exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Assistant output, made of content blocks.
    Assistant(AssistantMessage),
    /// System notice (init, permission events, ...).
    System(SystemMessage),
    /// Final summary of the exchange.
    Result(ResultSummary),
    /// Echo of user-side content, usually tool results.
    User(UserMessage),
    /// Partial streaming update.
    StreamEvent(Value),
    /// Any message type this crate does not know about.
    Unknown { msg_type: String, payload: Value },
}

impl InboundMessage {
    /// Whether this message ends the exchange.
    #[must_use]
    pub const fn is_result(&self) -> bool {
        matches!(self, Self::Result(_))
    }
}

/// Assistant message.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantMessage {
    pub content: Vec<ContentBlock>,
    pub model: Option<String>,
}

/// Content block inside an assistant message.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: Value,
        is_error: Option<bool>,
    },
    Thinking {
        thinking: String,
        signature: Option<String>,
    },
    Unknown {
        block_type: String,
        payload: Value,
    },
}

/// System notice subtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemSubtype {
    Init,
    PermissionRequest,
    PermissionDenied,
    ToolBlocked,
    Other(String),
}

impl SystemSubtype {
    /// Parse a wire subtype.
    #[must_use]
    pub fn parse(subtype: &str) -> Self {
        match subtype {
            "init" => Self::Init,
            "permission_request" => Self::PermissionRequest,
            "permission_denied" => Self::PermissionDenied,
            "tool_blocked" => Self::ToolBlocked,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of the subtype.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Init => "init",
            Self::PermissionRequest => "permission_request",
            Self::PermissionDenied => "permission_denied",
            Self::ToolBlocked => "tool_blocked",
            Self::Other(other) => other,
        }
    }
}

/// System notice with its raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemMessage {
    pub subtype: SystemSubtype,
    /// The complete message object as sent by the runtime.
    pub data: Value,
}

impl SystemMessage {
    /// Session identifier carried by the notice, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.data.get("session_id").and_then(Value::as_str)
    }
}

/// Exchange summary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSummary {
    pub subtype: String,
    pub session_id: Option<String>,
    pub is_error: bool,
    pub duration_ms: u64,
    pub num_turns: u32,
    pub total_cost_usd: Option<f64>,
    pub result: Option<String>,
}

/// User message echo.
#[derive(Debug, Clone, PartialEq)]
pub struct UserMessage {
    pub content: Value,
}

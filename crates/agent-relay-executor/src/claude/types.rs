//! Claude Code SDK control protocol types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const CONTROL_REQUEST: &str = "control_request";
const CONTROL_RESPONSE: &str = "control_response";

/// Message written to the CLI's stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// A user prompt.
    User {
        message: UserContent,
        parent_tool_use_id: Option<String>,
        session_id: String,
    },
}

impl Message {
    /// Create a user prompt message.
    #[must_use]
    pub fn new_user(content: String) -> Self {
        Self::User {
            message: UserContent {
                role: "user".to_string(),
                content,
            },
            parent_tool_use_id: None,
            session_id: "default".to_string(),
        }
    }
}

/// Role and text of a user prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContent {
    pub role: String,
    pub content: String,
}

/// Control request sent from the SDK side to the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SDKControlRequest {
    #[serde(rename = "type")]
    message_type: &'static str,
    pub request_id: String,
    pub request: SDKControlRequestType,
}

impl SDKControlRequest {
    /// Wrap a request with a fresh request id.
    #[must_use]
    pub fn new(request: SDKControlRequestType) -> Self {
        Self {
            message_type: CONTROL_REQUEST,
            request_id: format!("req_{}", Uuid::new_v4().simple()),
            request,
        }
    }
}

/// SDK-side control request kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum SDKControlRequestType {
    /// Protocol handshake.
    Initialize { hooks: Option<Value> },
    /// Stop the in-flight generation.
    Interrupt {},
}

/// Control traffic read from the CLI's stdout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// The CLI asks the SDK side for a decision.
    ControlRequest {
        request_id: String,
        request: ControlRequestType,
    },
    /// Answer to one of our requests.
    ControlResponse { response: ControlResponseType },
    /// The CLI withdrew one of its requests.
    ControlCancelRequest {
        #[serde(default)]
        request_id: Option<String>,
    },
}

impl ControlMessage {
    /// Whether a stdout message type belongs to the control protocol.
    #[must_use]
    pub fn is_control_type(message_type: &str) -> bool {
        matches!(
            message_type,
            "control_request" | "control_response" | "control_cancel_request"
        )
    }
}

/// CLI-side control request kinds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ControlRequestType {
    CanUseTool {
        tool_name: String,
        #[serde(default)]
        input: Value,
        #[serde(default)]
        tool_use_id: Option<String>,
    },
    HookCallback {
        callback_id: String,
        #[serde(default)]
        input: Value,
        #[serde(default)]
        tool_use_id: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

/// Control response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlResponseMessage {
    #[serde(rename = "type")]
    message_type: &'static str,
    pub response: ControlResponseType,
}

impl ControlResponseMessage {
    /// Wrap a response.
    #[must_use]
    pub const fn new(response: ControlResponseType) -> Self {
        Self {
            message_type: CONTROL_RESPONSE,
            response,
        }
    }
}

/// Control response outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ControlResponseType {
    Success {
        request_id: String,
        #[serde(default)]
        response: Option<Value>,
    },
    Error {
        request_id: String,
        #[serde(default)]
        error: Option<String>,
    },
}

impl ControlResponseType {
    /// Id of the request this answers.
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Self::Success { request_id, .. } | Self::Error { request_id, .. } => request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message_shape() {
        let value = serde_json::to_value(Message::new_user("hi".into())).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "user",
                "message": {"role": "user", "content": "hi"},
                "parent_tool_use_id": null,
                "session_id": "default"
            })
        );
    }

    #[test]
    fn test_control_request_shape() {
        let request = SDKControlRequest::new(SDKControlRequestType::Initialize { hooks: None });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "control_request");
        assert_eq!(value["request"], json!({"subtype": "initialize", "hooks": null}));
        assert!(value["request_id"].as_str().unwrap().starts_with("req_"));

        let interrupt = SDKControlRequest::new(SDKControlRequestType::Interrupt {});
        let value = serde_json::to_value(&interrupt).unwrap();
        assert_eq!(value["request"], json!({"subtype": "interrupt"}));
        assert_ne!(interrupt.request_id, request.request_id);
    }

    #[test]
    fn test_parse_control_response() {
        let msg: ControlMessage = serde_json::from_value(json!({
            "type": "control_response",
            "response": {"subtype": "error", "request_id": "req_1", "error": "nope"}
        }))
        .unwrap();
        let ControlMessage::ControlResponse { response } = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(response.request_id(), "req_1");
        assert!(matches!(response, ControlResponseType::Error { error: Some(_), .. }));
    }

    #[test]
    fn test_parse_unsupported_control_request() {
        let msg: ControlMessage = serde_json::from_value(json!({
            "type": "control_request",
            "request_id": "cli_1",
            "request": {"subtype": "mcp_message", "server_name": "x"}
        }))
        .unwrap();
        assert_eq!(
            msg,
            ControlMessage::ControlRequest {
                request_id: "cli_1".into(),
                request: ControlRequestType::Unsupported,
            }
        );
    }

    #[test]
    fn test_error_response_shape() {
        let msg = ControlResponseMessage::new(ControlResponseType::Error {
            request_id: "cli_1".into(),
            error: Some("unsupported".into()),
        });
        assert_eq!(
            serde_json::to_value(msg).unwrap(),
            json!({
                "type": "control_response",
                "response": {"subtype": "error", "request_id": "cli_1", "error": "unsupported"}
            })
        );
    }
}

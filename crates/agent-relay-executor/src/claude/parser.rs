//! Parser for Claude Code stream-json output.
//!
//! Tolerant reader: unknown fields are ignored, unknown message and block
//! types are kept as `Unknown` values instead of failing.

use agent_relay_core::{
    ContentBlock, InboundMessage, SystemSubtype,
    message::{AssistantMessage, ResultSummary, SystemMessage, UserMessage},
};
use serde_json::Value;
use thiserror::Error;

/// Parse error.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Missing 'type' field")]
    MissingType,
}

/// Parse a JSON value into an inbound message.
///
/// # Errors
/// Returns error if the value has no string `type` field.
pub fn parse_value(raw: &Value) -> Result<InboundMessage, ParseError> {
    let msg_type = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingType)?;

    Ok(match msg_type {
        "system" => parse_system(raw),
        "assistant" => parse_assistant(raw),
        "user" => parse_user(raw),
        "result" => parse_result(raw),
        "stream_event" => {
            InboundMessage::StreamEvent(raw.get("event").cloned().unwrap_or(Value::Null))
        }
        other => InboundMessage::Unknown {
            msg_type: other.to_string(),
            payload: raw.clone(),
        },
    })
}

fn str_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(String::from)
}

fn parse_system(raw: &Value) -> InboundMessage {
    let subtype = raw.get("subtype").and_then(Value::as_str).unwrap_or("");
    InboundMessage::System(SystemMessage {
        subtype: SystemSubtype::parse(subtype),
        data: raw.clone(),
    })
}

fn parse_assistant(raw: &Value) -> InboundMessage {
    let msg = raw.get("message").unwrap_or(raw);
    let content = msg
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter().map(parse_content_block).collect())
        .unwrap_or_default();

    InboundMessage::Assistant(AssistantMessage {
        content,
        model: str_field(msg, "model"),
    })
}

fn parse_content_block(block: &Value) -> ContentBlock {
    known_content_block(block).unwrap_or_else(|| ContentBlock::Unknown {
        block_type: str_field(block, "type").unwrap_or_default(),
        payload: block.clone(),
    })
}

fn known_content_block(block: &Value) -> Option<ContentBlock> {
    match block.get("type")?.as_str()? {
        "text" => Some(ContentBlock::Text {
            text: str_field(block, "text")?,
        }),
        "tool_use" => Some(ContentBlock::ToolUse {
            id: str_field(block, "id")?,
            name: str_field(block, "name")?,
            input: block.get("input").cloned().unwrap_or(Value::Null),
        }),
        "tool_result" => Some(ContentBlock::ToolResult {
            tool_use_id: str_field(block, "tool_use_id")?,
            content: block.get("content").cloned().unwrap_or(Value::Null),
            is_error: block.get("is_error").and_then(Value::as_bool),
        }),
        "thinking" => Some(ContentBlock::Thinking {
            thinking: str_field(block, "thinking")?,
            signature: str_field(block, "signature"),
        }),
        _ => None,
    }
}

fn parse_user(raw: &Value) -> InboundMessage {
    let msg = raw.get("message").unwrap_or(raw);
    InboundMessage::User(UserMessage {
        content: msg.get("content").cloned().unwrap_or(Value::Null),
    })
}

fn parse_result(raw: &Value) -> InboundMessage {
    InboundMessage::Result(ResultSummary {
        subtype: str_field(raw, "subtype").unwrap_or_default(),
        session_id: str_field(raw, "session_id"),
        is_error: raw.get("is_error").and_then(Value::as_bool).unwrap_or(false),
        duration_ms: raw.get("duration_ms").and_then(Value::as_u64).unwrap_or(0),
        num_turns: raw
            .get("num_turns")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        total_cost_usd: raw.get("total_cost_usd").and_then(Value::as_f64),
        result: str_field(raw, "result"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_line(line: &str) -> Result<InboundMessage, ParseError> {
        parse_value(&serde_json::from_str(line).unwrap())
    }

    #[test]
    fn test_parse_system_init() {
        let msg = parse_line(
            r#"{"type":"system","subtype":"init","session_id":"abc","model":"claude","tools":[]}"#,
        )
        .unwrap();
        let InboundMessage::System(system) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(system.subtype, SystemSubtype::Init);
        assert_eq!(system.session_id(), Some("abc"));
    }

    #[test]
    fn test_parse_permission_notice() {
        let msg = parse_line(r#"{"type":"system","subtype":"permission_denied"}"#).unwrap();
        assert!(matches!(
            msg,
            InboundMessage::System(SystemMessage {
                subtype: SystemSubtype::PermissionDenied,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_assistant_blocks() {
        let raw = json!({
            "type": "assistant",
            "message": {
                "model": "claude-sonnet",
                "content": [
                    {"type": "text", "text": "Hello"},
                    {"type": "tool_use", "id": "toolu_1", "name": "Read", "input": {"path": "/a"}},
                    {"type": "thinking", "thinking": "hmm", "signature": "sig"},
                    {
                        "type": "tool_result",
                        "tool_use_id": "toolu_1",
                        "content": "data",
                        "is_error": false
                    },
                    {"type": "image", "source": {}},
                    {"type": "text"}
                ]
            }
        });
        let InboundMessage::Assistant(assistant) = parse_value(&raw).unwrap() else {
            panic!("Wrong message type");
        };
        assert_eq!(assistant.model.as_deref(), Some("claude-sonnet"));
        assert_eq!(assistant.content.len(), 6);
        assert_eq!(
            assistant.content[0],
            ContentBlock::Text {
                text: "Hello".into()
            }
        );
        assert_eq!(
            assistant.content[1],
            ContentBlock::ToolUse {
                id: "toolu_1".into(),
                name: "Read".into(),
                input: json!({"path": "/a"}),
            }
        );
        assert!(matches!(assistant.content[2], ContentBlock::Thinking { .. }));
        assert!(matches!(
            assistant.content[3],
            ContentBlock::ToolResult {
                is_error: Some(false),
                ..
            }
        ));
        let unknown: Vec<_> = assistant.content[4..]
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Unknown { block_type, .. } => Some(block_type.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(unknown, ["image", "text"]);
    }

    #[test]
    fn test_parse_result() {
        let msg = parse_value(&json!({
            "type": "result",
            "subtype": "success",
            "session_id": "abc",
            "is_error": false,
            "duration_ms": 1200,
            "num_turns": 3,
            "total_cost_usd": 0.04,
            "result": "done"
        }))
        .unwrap();
        let InboundMessage::Result(summary) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(summary.subtype, "success");
        assert_eq!(summary.session_id.as_deref(), Some("abc"));
        assert_eq!(summary.duration_ms, 1200);
        assert_eq!(summary.num_turns, 3);
        assert_eq!(summary.total_cost_usd, Some(0.04));
        assert_eq!(summary.result.as_deref(), Some("done"));
    }

    #[test]
    fn test_parse_user_and_stream_event() {
        let user = parse_line(r#"{"type":"user","message":{"role":"user","content":[]}}"#).unwrap();
        assert!(matches!(user, InboundMessage::User(_)));

        let event =
            parse_line(r#"{"type":"stream_event","event":{"type":"message_start"}}"#).unwrap();
        assert_eq!(
            event,
            InboundMessage::StreamEvent(json!({"type": "message_start"}))
        );
    }

    #[test]
    fn test_parse_unknown_type() {
        let msg = parse_line(r#"{"type":"keep_alive"}"#).unwrap();
        assert!(
            matches!(msg, InboundMessage::Unknown { msg_type, .. } if msg_type == "keep_alive")
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_line(r#"{"subtype":"init"}"#),
            Err(ParseError::MissingType)
        ));
        assert!(matches!(
            parse_value(&json!({"type": 7})),
            Err(ParseError::MissingType)
        ));
    }
}

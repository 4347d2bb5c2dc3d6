//! Agent message to outbound event translation.

use crate::{ContentBlock, InboundMessage, OutboundEvent, PermissionStatus, SystemSubtype};

/// Translates one exchange's inbound messages, in arrival order.
#[derive(Debug, Default)]
pub struct EventTranslator {
    has_text_response: bool,
}

impl EventTranslator {
    /// Create a translator for a new exchange.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events for a single inbound message.
    ///
    /// Init notices produce nothing here; the caller records their session id.
    pub fn translate(&mut self, message: &InboundMessage) -> Vec<OutboundEvent> {
        match message {
            InboundMessage::Assistant(assistant) => assistant
                .content
                .iter()
                .filter_map(|block| self.translate_block(block))
                .collect(),
            InboundMessage::System(system) => permission_status(&system.subtype)
                .map(OutboundEvent::Permission)
                .into_iter()
                .collect(),
            InboundMessage::Result(_)
            | InboundMessage::User(_)
            | InboundMessage::StreamEvent(_)
            | InboundMessage::Unknown { .. } => Vec::new(),
        }
    }

    /// Closing events: the no-text notice if needed, then the sentinel.
    #[must_use]
    pub fn finish(self) -> Vec<OutboundEvent> {
        let mut events = Vec::with_capacity(2);
        if !self.has_text_response {
            events.push(OutboundEvent::NoTextResponse);
        }
        events.push(OutboundEvent::Done);
        events
    }

    fn translate_block(&mut self, block: &ContentBlock) -> Option<OutboundEvent> {
        match block {
            ContentBlock::Text { text } if !text.trim().is_empty() => {
                self.has_text_response = true;
                Some(OutboundEvent::Text(text.clone()))
            }
            ContentBlock::ToolUse { name, input, .. } => {
                Some(OutboundEvent::tool_use(name.as_str(), input))
            }
            _ => None,
        }
    }
}

const fn permission_status(subtype: &SystemSubtype) -> Option<PermissionStatus> {
    match subtype {
        SystemSubtype::PermissionRequest => Some(PermissionStatus::Request),
        SystemSubtype::PermissionDenied => Some(PermissionStatus::Denied),
        SystemSubtype::ToolBlocked => Some(PermissionStatus::ToolBlocked),
        SystemSubtype::Init | SystemSubtype::Other(_) => None,
    }
}

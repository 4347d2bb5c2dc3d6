//! In-memory agent runtime for tests.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};

use crate::{
    AgentConnection, AgentError, AgentOptions, AgentRuntime, ContentBlock, InboundMessage,
    MessageStream, SystemSubtype,
    message::{AssistantMessage, ResultSummary, SystemMessage},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Messages one connection will replay.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub messages: Vec<InboundMessage>,
    /// Yield a stream error after the messages.
    pub fail_after: bool,
    /// Reject the prompt.
    pub fail_query: bool,
}

/// Runtime handing out [`FakeConnection`]s that replay queued scripts.
#[derive(Default)]
pub struct FakeRuntime {
    scripts: Mutex<VecDeque<Script>>,
    connects: Mutex<Vec<AgentOptions>>,
    connections: Mutex<Vec<Arc<FakeConnection>>>,
    pub fail_connect: AtomicBool,
}

impl FakeRuntime {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the messages for the next connection.
    pub fn push_script(&self, messages: Vec<InboundMessage>) {
        self.push(Script {
            messages,
            ..Script::default()
        });
    }

    /// Queue a script.
    pub fn push(&self, script: Script) {
        lock(&self.scripts).push_back(script);
    }

    /// Options of every connect call, in order.
    #[must_use]
    pub fn connects(&self) -> Vec<AgentOptions> {
        lock(&self.connects).clone()
    }

    /// Resume tokens of every connect call, in order.
    #[must_use]
    pub fn resumes(&self) -> Vec<Option<String>> {
        self.connects().into_iter().map(|o| o.resume).collect()
    }

    /// Connections handed out so far.
    #[must_use]
    pub fn connections(&self) -> Vec<Arc<FakeConnection>> {
        lock(&self.connections).clone()
    }
}

#[async_trait]
impl AgentRuntime for FakeRuntime {
    async fn connect(
        &self,
        options: &AgentOptions,
    ) -> Result<Arc<dyn AgentConnection>, AgentError> {
        lock(&self.connects).push(options.clone());
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(AgentError::SpawnFailed("fake connect failure".to_string()));
        }

        let script = lock(&self.scripts).pop_front().unwrap_or_default();
        let connection = Arc::new(FakeConnection::with_script(script));
        lock(&self.connections).push(Arc::clone(&connection));
        Ok(connection)
    }
}

/// Connection that records calls and replays a script.
#[derive(Default)]
pub struct FakeConnection {
    script: Mutex<Option<Script>>,
    prompts: Mutex<Vec<String>>,
    pub interrupts: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub fail_query: AtomicBool,
    pub fail_interrupt: AtomicBool,
    pub fail_disconnect: AtomicBool,
}

impl FakeConnection {
    #[must_use]
    pub fn with_script(script: Script) -> Self {
        Self {
            fail_query: AtomicBool::new(script.fail_query),
            script: Mutex::new(Some(script)),
            ..Self::default()
        }
    }

    /// Prompts received, in order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl AgentConnection for FakeConnection {
    async fn query(&self, prompt: &str) -> Result<(), AgentError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(AgentError::Closed);
        }
        lock(&self.prompts).push(prompt.to_string());
        Ok(())
    }

    fn receive_response(&self) -> MessageStream {
        let script = lock(&self.script).take().unwrap_or_default();
        let tail = script
            .fail_after
            .then(|| Err(AgentError::Protocol("fake stream failure".to_string())));
        futures::stream::iter(script.messages.into_iter().map(Ok).chain(tail)).boxed()
    }

    async fn interrupt(&self) -> Result<(), AgentError> {
        if self.fail_interrupt.load(Ordering::SeqCst) {
            return Err(AgentError::Closed);
        }
        self.interrupts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AgentError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(AgentError::Closed);
        }
        Ok(())
    }
}

/// Text block.
#[must_use]
pub fn text(text: &str) -> ContentBlock {
    ContentBlock::Text {
        text: text.to_string(),
    }
}

/// Tool-use block.
#[must_use]
pub fn tool_use(name: &str, input: Value) -> ContentBlock {
    ContentBlock::ToolUse {
        id: format!("toolu_{name}"),
        name: name.to_string(),
        input,
    }
}

/// Assistant message with the given blocks.
#[must_use]
pub fn assistant(content: Vec<ContentBlock>) -> InboundMessage {
    InboundMessage::Assistant(AssistantMessage {
        content,
        model: None,
    })
}

/// System notice with the given subtype.
#[must_use]
pub fn system(subtype: &str) -> InboundMessage {
    InboundMessage::System(SystemMessage {
        subtype: SystemSubtype::parse(subtype),
        data: json!({"type": "system", "subtype": subtype}),
    })
}

/// Init notice, optionally carrying a session id.
#[must_use]
pub fn init(session_id: Option<&str>) -> InboundMessage {
    let mut data = json!({"type": "system", "subtype": "init"});
    if let Some(id) = session_id {
        data["session_id"] = Value::String(id.to_string());
    }
    InboundMessage::System(SystemMessage {
        subtype: SystemSubtype::Init,
        data,
    })
}

/// Successful result summary.
#[must_use]
pub fn result() -> InboundMessage {
    InboundMessage::Result(ResultSummary {
        subtype: "success".to_string(),
        ..ResultSummary::default()
    })
}

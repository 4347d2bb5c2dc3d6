//! Core traits for agent runtimes.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::{AgentOptions, InboundMessage};

/// Lazy, single-pass stream of messages for one exchange.
pub type MessageStream = BoxStream<'static, Result<InboundMessage, AgentError>>;

/// Agent runtime error.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),
    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Agent rejected request: {0}")]
    Rejected(String),
    #[error("Agent connection closed")]
    Closed,
}

/// Trait for agent runtimes.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Open a connection configured with `options`.
    async fn connect(&self, options: &AgentOptions) -> Result<Arc<dyn AgentConnection>, AgentError>;
}

/// A live connection to the agent runtime.
#[async_trait]
pub trait AgentConnection: Send + Sync {
    /// Issue a prompt.
    async fn query(&self, prompt: &str) -> Result<(), AgentError>;

    /// Messages for the most recent prompt, ending after the result summary.
    fn receive_response(&self) -> MessageStream;

    /// Ask the runtime to stop the in-flight generation.
    async fn interrupt(&self) -> Result<(), AgentError>;

    /// Close the connection and release the runtime.
    async fn disconnect(&self) -> Result<(), AgentError>;
}

//! Prompt forwarding.

use std::sync::Arc;

use crate::{AgentError, AgentOptions, AgentRuntime, MessageStream, SessionSlot};

/// Opens (or resumes) an agent conversation and issues prompts to it.
pub struct PromptForwarder {
    runtime: Arc<dyn AgentRuntime>,
    options: AgentOptions,
}

impl PromptForwarder {
    /// Create a forwarder with the relay's fixed agent options.
    #[must_use]
    pub fn new(runtime: Arc<dyn AgentRuntime>, options: AgentOptions) -> Self {
        Self { runtime, options }
    }

    /// Connect with the slot's resume token, install the connection in the
    /// slot and send `prompt` unchanged.
    ///
    /// # Errors
    /// Returns error if connecting or sending the prompt fails.
    pub async fn forward(
        &self,
        session: &SessionSlot,
        prompt: &str,
    ) -> Result<MessageStream, AgentError> {
        let resume = session.resolve().await;
        tracing::debug!(resume = ?resume, "Connecting to agent");

        let options = self.options.clone().with_resume(resume);
        let connection = self.runtime.connect(&options).await?;
        session.install(Arc::clone(&connection)).await;

        connection.query(prompt).await?;
        Ok(connection.receive_response())
    }
}

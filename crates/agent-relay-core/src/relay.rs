//! Chat exchange driver.

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    AgentError, AgentOptions, AgentRuntime, EventTranslator, InboundMessage, OutboundEvent,
    PromptForwarder, SessionSlot, SystemSubtype,
};

/// Outbound events buffered per exchange.
const EXCHANGE_BUFFER: usize = 64;

/// Ordered outbound events of one exchange. An `Err` item is the last one.
pub type EventStream = ReceiverStream<Result<OutboundEvent, RelayError>>;

/// Exchange failure.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to reach agent: {0}")]
    Connect(#[source] AgentError),
    #[error("Agent stream failed: {0}")]
    Stream(#[source] AgentError),
}

/// The relay service: one session slot plus the forwarder feeding it.
pub struct Relay {
    forwarder: PromptForwarder,
    session: SessionSlot,
}

impl Relay {
    /// Create a relay over `runtime` using `options` for every connection.
    #[must_use]
    pub fn new(runtime: Arc<dyn AgentRuntime>, options: AgentOptions) -> Arc<Self> {
        Arc::new(Self {
            forwarder: PromptForwarder::new(runtime, options),
            session: SessionSlot::new(),
        })
    }

    /// The session slot.
    #[must_use]
    pub const fn session(&self) -> &SessionSlot {
        &self.session
    }

    /// Forget the session, returning the cleared token.
    pub async fn reset(&self) -> Option<String> {
        self.session.reset().await
    }

    /// Interrupt the in-flight generation, if any.
    pub async fn interrupt(&self) -> bool {
        self.session.interrupt().await
    }

    /// Start an exchange for `prompt`.
    ///
    /// The exchange runs on its own task; the returned stream yields its
    /// events in order, ending with [`OutboundEvent::Done`] on success or
    /// with an error item if the exchange failed.
    #[must_use]
    pub fn chat(self: &Arc<Self>, prompt: String) -> EventStream {
        let (tx, rx) = mpsc::channel(EXCHANGE_BUFFER);
        let relay = Arc::clone(self);

        tokio::spawn(async move {
            if let Err(e) = relay.run_exchange(&prompt, &tx).await {
                tracing::error!("Chat exchange failed: {e}");
                let _ = tx.send(Err(e)).await;
            }
        });

        ReceiverStream::new(rx)
    }

    async fn run_exchange(
        &self,
        prompt: &str,
        tx: &mpsc::Sender<Result<OutboundEvent, RelayError>>,
    ) -> Result<(), RelayError> {
        let mut inbound = self
            .forwarder
            .forward(&self.session, prompt)
            .await
            .map_err(RelayError::Connect)?;
        let mut translator = EventTranslator::new();

        while let Some(message) = inbound.next().await {
            let message = message.map_err(RelayError::Stream)?;

            match &message {
                InboundMessage::System(system) if system.subtype == SystemSubtype::Init => {
                    self.session.observe_init(system.session_id()).await;
                }
                InboundMessage::Result(summary) => {
                    tracing::info!(
                        subtype = %summary.subtype,
                        is_error = summary.is_error,
                        duration_ms = summary.duration_ms,
                        num_turns = summary.num_turns,
                        cost_usd = ?summary.total_cost_usd,
                        "Agent exchange finished"
                    );
                }
                _ => {}
            }

            for event in translator.translate(&message) {
                if !emit(tx, event).await {
                    return Ok(());
                }
            }
        }

        for event in translator.finish() {
            if !emit(tx, event).await {
                return Ok(());
            }
        }
        Ok(())
    }
}

async fn emit(tx: &mpsc::Sender<Result<OutboundEvent, RelayError>>, event: OutboundEvent) -> bool {
    if tx.send(Ok(event)).await.is_err() {
        tracing::debug!("Chat client went away, stopping exchange");
        return false;
    }
    true
}

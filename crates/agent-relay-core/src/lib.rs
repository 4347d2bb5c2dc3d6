//! Core of the agent relay.
//!
//! This crate provides:
//! - `SessionSlot` - The single resumable conversation and its live connection
//! - `PromptForwarder` - Opens an agent connection and issues a prompt
//! - `EventTranslator` - Maps agent messages to browser-facing text events
//! - `Relay` - Drives one chat exchange end to end
//! - `AgentRuntime` and `AgentConnection` traits for agent backends

pub mod config;
pub mod event;
pub mod forward;
pub mod message;
pub mod relay;
pub mod session;
pub mod traits;
pub mod translate;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{AgentOptions, SettingsProfile, SystemPrompt};
pub use event::{OutboundEvent, PermissionStatus};
pub use forward::PromptForwarder;
pub use message::{ContentBlock, InboundMessage, SystemSubtype};
pub use relay::{EventStream, Relay, RelayError};
pub use session::SessionSlot;
pub use traits::{AgentConnection, AgentError, AgentRuntime, MessageStream};
pub use translate::EventTranslator;

//! Claude Code runtime and SDK protocol.

pub mod client;
pub mod parser;
pub mod protocol;
pub mod types;

pub use client::{ClaudeConnection, ClaudeRuntime};
pub use protocol::ProtocolPeer;

//! Claude Code agent runtime for the relay.
//!
//! Provides:
//! - Claude Code SDK stream-json protocol types and parser
//! - Command building utilities
//! - `ClaudeRuntime` implementing the core `AgentRuntime` trait

pub mod claude;
pub mod command;

pub use claude::{ClaudeConnection, ClaudeRuntime};
pub use command::{CommandBuilder, CommandParts};

//! HTTP transport for the agent relay.
//!
//! Provides:
//! - Wire types for the JSON endpoints
//! - SSE streaming of chat exchanges
//! - `create_router` wiring the browser-facing routes

pub mod error;
pub mod handlers;
pub mod protocol;
pub mod router;

pub use error::TransportError;
pub use protocol::{ChatRequest, InterruptResponse, ResetResponse};
pub use router::{AppState, create_router};

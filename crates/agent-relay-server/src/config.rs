//! Server configuration from the environment.

use std::{net::SocketAddr, path::PathBuf};

use agent_relay_executor::claude::client::DEFAULT_CLAUDE_COMMAND;
use anyhow::Context;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";

/// Default browser UI document.
pub const DEFAULT_INDEX: &str = "index.html";

const ENV_ADDR: &str = "AGENT_RELAY_ADDR";
const ENV_INDEX: &str = "AGENT_RELAY_INDEX";
const ENV_CLAUDE: &str = "AGENT_RELAY_CLAUDE";
const ENV_WORKDIR: &str = "AGENT_RELAY_WORKDIR";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub addr: SocketAddr,
    /// Browser UI document served at `/`.
    pub index_path: PathBuf,
    /// Command used to launch Claude Code.
    pub claude_command: String,
    /// Working directory for the agent.
    pub working_dir: PathBuf,
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    /// Returns error if the listen address is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup(ENV_ADDR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse()
            .with_context(|| format!("{ENV_ADDR} is not a socket address: {addr}"))?;

        let working_dir = match lookup(ENV_WORKDIR) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };

        Ok(Self {
            addr,
            index_path: lookup(ENV_INDEX)
                .map_or_else(|| PathBuf::from(DEFAULT_INDEX), PathBuf::from),
            claude_command: lookup(ENV_CLAUDE)
                .unwrap_or_else(|| DEFAULT_CLAUDE_COMMAND.to_string()),
            working_dir,
        })
    }
}

//! Claude Code agent runtime.

use std::{
    path::PathBuf,
    process::Stdio,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use agent_relay_core::{
    AgentConnection, AgentError, AgentOptions, AgentRuntime, InboundMessage, MessageStream,
    SystemPrompt,
};
use async_trait::async_trait;
use command_group::{AsyncCommandGroup, AsyncGroupChild};
use futures::StreamExt;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{ChildStderr, Command},
    sync::{mpsc, oneshot},
};

use super::protocol::ProtocolPeer;
use crate::command::{CommandBuildError, CommandBuilder, CommandParts};

/// Default Claude Code executable.
pub const DEFAULT_CLAUDE_COMMAND: &str = "claude";

impl From<CommandBuildError> for AgentError {
    fn from(e: CommandBuildError) -> Self {
        match e {
            CommandBuildError::ExecutableNotFound(program) => Self::ExecutableNotFound(program),
            other => Self::SpawnFailed(other.to_string()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runtime that launches the Claude Code CLI in SDK streaming mode.
#[derive(Debug, Clone)]
pub struct ClaudeRuntime {
    command: CommandBuilder,
    working_dir: PathBuf,
}

impl ClaudeRuntime {
    /// Create a runtime running `base_command` in `working_dir`.
    #[must_use]
    pub fn new(base_command: impl Into<String>, working_dir: PathBuf) -> Self {
        let command = CommandBuilder::new(base_command).params([
            "--output-format",
            "stream-json",
            "--verbose",
            "--input-format",
            "stream-json",
        ]);
        Self {
            command,
            working_dir,
        }
    }

    /// Command line for a connection with `options`.
    ///
    /// # Errors
    /// Returns error if the base command is invalid.
    pub fn command_for(&self, options: &AgentOptions) -> Result<CommandParts, CommandBuildError> {
        let builder = self.command.clone().extend_params(option_args(options));
        match options.resume.as_deref() {
            Some(session_id) => builder.build_follow_up(session_id),
            None => builder.build_initial(),
        }
    }
}

fn option_args(options: &AgentOptions) -> Vec<String> {
    let mut args = Vec::new();

    match &options.system_prompt {
        SystemPrompt::Preset { append, .. } => {
            if let Some(append) = append {
                args.push("--append-system-prompt".to_string());
                args.push(append.clone());
            }
        }
        SystemPrompt::Custom { text } => {
            args.push("--system-prompt".to_string());
            args.push(text.clone());
        }
    }

    args.push("--settings".to_string());
    args.push(options.settings.to_string_lossy().into_owned());

    if !options.setting_sources.is_empty() {
        args.push("--setting-sources".to_string());
        args.push(options.setting_sources.join(","));
    }

    args
}

#[async_trait]
impl AgentRuntime for ClaudeRuntime {
    async fn connect(
        &self,
        options: &AgentOptions,
    ) -> Result<Arc<dyn AgentConnection>, AgentError> {
        let (program, args) = self.command_for(options)?.into_resolved().await?;
        tracing::debug!(?program, ?args, "Spawning Claude Code");

        let mut command = Command::new(&program);
        command
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .group_spawn()
            .map_err(|e| AgentError::SpawnFailed(e.to_string()))?;

        let inner = child.inner();
        let (Some(stdin), Some(stdout), Some(stderr)) =
            (inner.stdin.take(), inner.stdout.take(), inner.stderr.take())
        else {
            return Err(AgentError::SpawnFailed("child stdio not captured".to_string()));
        };
        spawn_stderr_logger(stderr);

        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let peer = ProtocolPeer::spawn(stdin, stdout, message_tx, shutdown_rx);
        let pid = child.id();

        // Dropping the connection on a failed handshake kills the process group.
        let connection = ClaudeConnection {
            peer,
            child: Mutex::new(Some(child)),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            messages: Arc::new(tokio::sync::Mutex::new(message_rx)),
        };
        connection.peer.initialize(None).await?;

        tracing::info!(?pid, resume = ?options.resume, "Connected to Claude Code");
        Ok(Arc::new(connection))
    }
}

fn spawn_stderr_logger(stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(target: "claude_stderr", "{line}");
        }
    });
}

/// A running Claude Code process.
///
/// The process group is killed on [`AgentConnection::disconnect`], or when
/// the connection is dropped.
pub struct ClaudeConnection {
    peer: ProtocolPeer,
    child: Mutex<Option<AsyncGroupChild>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    messages: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<InboundMessage>>>,
}

#[async_trait]
impl AgentConnection for ClaudeConnection {
    async fn query(&self, prompt: &str) -> Result<(), AgentError> {
        self.peer.send_user_message(prompt.to_string()).await?;
        Ok(())
    }

    fn receive_response(&self) -> MessageStream {
        let messages = Arc::clone(&self.messages);
        futures::stream::unfold((messages, false), |(messages, done)| async move {
            if done {
                return None;
            }
            let next = messages.lock().await.recv().await;
            match next {
                Some(message) => {
                    let done = message.is_result();
                    Some((Ok(message), (messages, done)))
                }
                // The process went away before finishing the exchange.
                None => Some((Err(AgentError::Closed), (messages, true))),
            }
        })
        .boxed()
    }

    async fn interrupt(&self) -> Result<(), AgentError> {
        self.peer.interrupt().await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AgentError> {
        if let Some(tx) = lock(&self.shutdown_tx).take() {
            let _ = tx.send(());
        }
        self.peer.end_input().await;

        let child = lock(&self.child).take();
        if let Some(mut child) = child {
            if let Err(e) = child.kill().await {
                tracing::debug!("Claude Code process already gone: {e}");
            }
            tracing::info!("Disconnected from Claude Code");
        }
        Ok(())
    }
}

impl Drop for ClaudeConnection {
    fn drop(&mut self) {
        let child = self
            .child
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut child) = child {
            tracing::debug!("Killing released Claude Code process");
            if let Err(e) = child.start_kill() {
                tracing::debug!("Failed to kill Claude Code process: {e}");
            }
        }
    }
}

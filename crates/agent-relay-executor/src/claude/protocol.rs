//! Claude Code control protocol handler.

use std::{collections::HashMap, sync::Arc};

use agent_relay_core::{AgentError, InboundMessage};
use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::{Mutex, mpsc, oneshot},
};

use super::parser;
use super::types::{
    ControlMessage, ControlRequestType, ControlResponseMessage, ControlResponseType, Message,
    SDKControlRequest, SDKControlRequestType,
};

/// Protocol error.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Protocol connection closed")]
    Closed,
}

impl From<ProtocolError> for AgentError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Io(e) => Self::Io(e),
            ProtocolError::Json(e) => Self::Protocol(e.to_string()),
            ProtocolError::Rejected(reason) => Self::Rejected(reason),
            ProtocolError::Closed => Self::Closed,
        }
    }
}

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Default)]
struct PendingRequests {
    closed: bool,
    waiters: HashMap<String, oneshot::Sender<ControlResponseType>>,
}

/// Handles bidirectional control protocol communication.
#[derive(Clone)]
pub struct ProtocolPeer {
    stdin: Arc<Mutex<Option<Writer>>>,
    pending: Arc<Mutex<PendingRequests>>,
}

impl ProtocolPeer {
    /// Spawn a new protocol peer.
    ///
    /// This starts a background task that reads `stdout`, answers control
    /// traffic and forwards every other message to `messages`. The task ends
    /// on EOF or when `shutdown_rx` fires or is dropped.
    #[must_use]
    pub fn spawn<W, R>(
        stdin: W,
        stdout: R,
        messages: mpsc::UnboundedSender<InboundMessage>,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        let peer = Self {
            stdin: Arc::new(Mutex::new(Some(Box::new(stdin)))),
            pending: Arc::new(Mutex::new(PendingRequests::default())),
        };

        let reader_peer = peer.clone();
        tokio::spawn(async move {
            if let Err(e) = reader_peer.read_loop(stdout, messages, shutdown_rx).await {
                tracing::error!("Protocol reader loop error: {}", e);
            }
        });

        peer
    }

    async fn read_loop<R>(
        &self,
        stdout: R,
        messages: mpsc::UnboundedSender<InboundMessage>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<(), ProtocolError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let mut reader = BufReader::new(stdout);
        let mut buffer = String::new();

        let result = loop {
            buffer.clear();
            tokio::select! {
                line_result = reader.read_line(&mut buffer) => {
                    match line_result {
                        Ok(0) => break Ok(()), // EOF
                        Ok(_) => {
                            let line = buffer.trim();
                            if line.is_empty() {
                                continue;
                            }
                            self.handle_line(line, &messages).await;
                        }
                        Err(e) => break Err(ProtocolError::Io(e)),
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Protocol reader shut down");
                    break Ok(());
                }
            }
        };

        // Fail every outstanding request; nothing will answer them now.
        let mut pending = self.pending.lock().await;
        pending.closed = true;
        pending.waiters.clear();
        result
    }

    async fn handle_line(&self, line: &str, messages: &mpsc::UnboundedSender<InboundMessage>) {
        let raw: Value = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping malformed agent output: {e}");
                return;
            }
        };

        let is_control = raw
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(ControlMessage::is_control_type);

        if is_control {
            match serde_json::from_value::<ControlMessage>(raw) {
                Ok(ControlMessage::ControlRequest {
                    request_id,
                    request,
                }) => self.handle_control_request(request_id, request).await,
                Ok(ControlMessage::ControlResponse { response }) => {
                    self.resolve_request(response).await;
                }
                Ok(ControlMessage::ControlCancelRequest { request_id }) => {
                    tracing::debug!(?request_id, "Agent cancelled control request");
                }
                Err(e) => tracing::warn!("Invalid control message: {e}"),
            }
            return;
        }

        match parser::parse_value(&raw) {
            Ok(message) => {
                tracing::debug!(?message, "Agent message");
                // The exchange may have stopped listening; keep draining.
                let _ = messages.send(message);
            }
            Err(e) => tracing::warn!("Skipping unparseable agent message: {e}"),
        }
    }

    async fn handle_control_request(&self, request_id: String, request: ControlRequestType) {
        let reason = match request {
            ControlRequestType::CanUseTool { tool_name, .. } => {
                tracing::warn!(
                    %tool_name,
                    "Agent asked for tool permission; no callback registered"
                );
                format!("No permission callback registered for tool '{tool_name}'")
            }
            ControlRequestType::HookCallback { callback_id, .. } => {
                tracing::warn!(%callback_id, "Agent invoked unknown hook callback");
                format!("No hook callback registered with id '{callback_id}'")
            }
            ControlRequestType::Unsupported => {
                tracing::warn!("Agent sent unsupported control request");
                "Unsupported control request".to_string()
            }
        };

        if let Err(e) = self.send_error(request_id, reason).await {
            tracing::error!("Failed to send error response: {e}");
        }
    }

    async fn resolve_request(&self, response: ControlResponseType) {
        let waiter = self
            .pending
            .lock()
            .await
            .waiters
            .remove(response.request_id());
        match waiter {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => tracing::debug!(
                request_id = response.request_id(),
                "Control response for unknown request"
            ),
        }
    }

    /// Send a control request and wait for its response.
    ///
    /// # Errors
    /// Returns error if the write fails, the agent rejects the request or the
    /// connection closes first.
    pub async fn request(
        &self,
        request: SDKControlRequestType,
    ) -> Result<Option<Value>, ProtocolError> {
        let request = SDKControlRequest::new(request);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.closed {
                return Err(ProtocolError::Closed);
            }
            pending.waiters.insert(request.request_id.clone(), tx);
        }

        if let Err(e) = self.send_json(&request).await {
            self.pending.lock().await.waiters.remove(&request.request_id);
            return Err(e);
        }

        match rx.await.map_err(|_| ProtocolError::Closed)? {
            ControlResponseType::Success { response, .. } => Ok(response),
            ControlResponseType::Error { error, .. } => Err(ProtocolError::Rejected(
                error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }

    async fn send_error(&self, request_id: String, error: String) -> Result<(), ProtocolError> {
        self.send_json(&ControlResponseMessage::new(ControlResponseType::Error {
            request_id,
            error: Some(error),
        }))
        .await
    }

    async fn send_json<T: serde::Serialize>(&self, message: &T) -> Result<(), ProtocolError> {
        let json = serde_json::to_string(message)?;
        let mut guard = self.stdin.lock().await;
        let stdin = guard.as_mut().ok_or(ProtocolError::Closed)?;
        stdin.write_all(json.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Send a user message.
    ///
    /// # Errors
    /// Returns error if write fails.
    pub async fn send_user_message(&self, content: String) -> Result<(), ProtocolError> {
        let message = Message::new_user(content);
        self.send_json(&message).await
    }

    /// Initialize the protocol.
    ///
    /// # Errors
    /// Returns error if the handshake fails.
    pub async fn initialize(&self, hooks: Option<Value>) -> Result<(), ProtocolError> {
        self.request(SDKControlRequestType::Initialize { hooks })
            .await
            .map(drop)
    }

    /// Send interrupt request.
    ///
    /// # Errors
    /// Returns error if the agent does not acknowledge the interrupt.
    pub async fn interrupt(&self) -> Result<(), ProtocolError> {
        self.request(SDKControlRequestType::Interrupt {})
            .await
            .map(drop)
    }

    /// Close stdin, signalling end of input to the agent.
    pub async fn end_input(&self) {
        if let Some(mut stdin) = self.stdin.lock().await.take() {
            if let Err(e) = stdin.shutdown().await {
                tracing::debug!("Failed to close agent stdin: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_relay_core::ContentBlock;
    use serde_json::json;
    use tokio::io::{DuplexStream, Lines};

    struct FakeCli {
        stdin: Lines<BufReader<DuplexStream>>,
        stdout: DuplexStream,
    }

    impl FakeCli {
        async fn next_sent(&mut self) -> Value {
            let line = self.stdin.next_line().await.unwrap().unwrap();
            serde_json::from_str(&line).unwrap()
        }

        async fn emit(&mut self, value: &Value) {
            self.emit_raw(&value.to_string()).await;
        }

        async fn emit_raw(&mut self, line: &str) {
            self.stdout.write_all(line.as_bytes()).await.unwrap();
            self.stdout.write_all(b"\n").await.unwrap();
        }
    }

    fn setup() -> (
        ProtocolPeer,
        FakeCli,
        mpsc::UnboundedReceiver<InboundMessage>,
        oneshot::Sender<()>,
    ) {
        let (peer_stdin, cli_stdin) = tokio::io::duplex(8192);
        let (cli_stdout, peer_stdout) = tokio::io::duplex(8192);
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let peer = ProtocolPeer::spawn(peer_stdin, peer_stdout, tx, shutdown_rx);
        let cli = FakeCli {
            stdin: BufReader::new(cli_stdin).lines(),
            stdout: cli_stdout,
        };
        (peer, cli, rx, shutdown_tx)
    }

    #[tokio::test]
    async fn test_initialize_waits_for_response() {
        let (peer, mut cli, _rx, _shutdown) = setup();
        let init = tokio::spawn({
            let peer = peer.clone();
            async move { peer.initialize(None).await }
        });

        let sent = cli.next_sent().await;
        assert_eq!(sent["type"], "control_request");
        assert_eq!(sent["request"]["subtype"], "initialize");

        cli.emit(&json!({
            "type": "control_response",
            "response": {"subtype": "success", "request_id": sent["request_id"], "response": {}}
        }))
        .await;

        tokio_test::assert_ok!(init.await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_interrupt() {
        let (peer, mut cli, _rx, _shutdown) = setup();
        let interrupt = tokio::spawn({
            let peer = peer.clone();
            async move { peer.interrupt().await }
        });

        let sent = cli.next_sent().await;
        assert_eq!(sent["request"], json!({"subtype": "interrupt"}));
        cli.emit(&json!({
            "type": "control_response",
            "response": {
                "subtype": "error",
                "request_id": sent["request_id"],
                "error": "not running"
            }
        }))
        .await;

        let result = interrupt.await.unwrap();
        assert!(matches!(result, Err(ProtocolError::Rejected(reason)) if reason == "not running"));
    }

    #[tokio::test]
    async fn test_messages_are_forwarded_in_order() {
        let (peer, mut cli, mut rx, _shutdown) = setup();
        peer.send_user_message("hello".into()).await.unwrap();
        let sent = cli.next_sent().await;
        assert_eq!(sent["message"]["content"], "hello");

        cli.emit(&json!({"type": "system", "subtype": "init", "session_id": "s-1"}))
            .await;
        cli.emit_raw("this is not json").await;
        cli.emit_raw("").await;
        cli.emit(&json!({
            "type": "assistant",
            "message": {"content": [{"type": "text", "text": "hi"}]}
        }))
        .await;
        cli.emit(&json!({"type": "result", "subtype": "success"})).await;

        assert!(matches!(rx.recv().await, Some(InboundMessage::System(_))));
        let Some(InboundMessage::Assistant(assistant)) = rx.recv().await else {
            panic!("Expected assistant message");
        };
        assert_eq!(assistant.content, vec![ContentBlock::Text { text: "hi".into() }]);
        assert!(matches!(rx.recv().await, Some(InboundMessage::Result(_))));
    }

    #[tokio::test]
    async fn test_control_requests_are_answered_with_errors() {
        let (_peer, mut cli, _rx, _shutdown) = setup();
        cli.emit(&json!({
            "type": "control_request",
            "request_id": "cli_7",
            "request": {"subtype": "can_use_tool", "tool_name": "Bash", "input": {}}
        }))
        .await;

        let sent = cli.next_sent().await;
        assert_eq!(sent["type"], "control_response");
        assert_eq!(sent["response"]["subtype"], "error");
        assert_eq!(sent["response"]["request_id"], "cli_7");
    }

    #[tokio::test]
    async fn test_requests_fail_after_eof() {
        let (peer, cli, mut rx, _shutdown) = setup();
        drop(cli);

        assert!(rx.recv().await.is_none());
        assert!(matches!(peer.interrupt().await, Err(ProtocolError::Closed)));
    }

    #[tokio::test]
    async fn test_shutdown_stops_reader() {
        let (peer, _cli, mut rx, shutdown) = setup();
        shutdown.send(()).unwrap();

        assert!(rx.recv().await.is_none());
        peer.end_input().await;
        assert!(matches!(
            peer.send_user_message("late".into()).await,
            Err(ProtocolError::Closed)
        ));
    }
}

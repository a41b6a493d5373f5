//! Shared fixtures for integration tests.
//!
//! [`RemoteEnd`] is a scripted in-process WebDriver BiDi remote end: it
//! accepts one WebSocket client, records every frame the client sends and
//! writes whatever the test pushes.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::{Context, anyhow};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;
use webdriver_bidi::CommandParameters;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for any single wait in a test.
pub const TEST_WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Logging
// ============================================================================

/// Installs a test-writer subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Protocol Fixtures
// ============================================================================

/// `module.command` with a single string parameter.
#[derive(Debug, Clone, Serialize)]
pub struct TestCommand {
    #[serde(rename = "paramName")]
    pub param_name: String,
}

impl TestCommand {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param_name: param.into(),
        }
    }
}

impl CommandParameters for TestCommand {
    type Result = TestResult;

    fn method_name(&self) -> &str {
        "module.command"
    }
}

/// Result shape `{"value": <string>}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestResult {
    pub value: String,
}

/// Payload of `module.event`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestEventArgs {
    #[serde(rename = "paramName")]
    pub param_name: String,
}

// ============================================================================
// RemoteEnd
// ============================================================================

/// In-process remote end bound to a random localhost port.
pub struct RemoteEnd {
    url: String,
    received: mpsc::UnboundedReceiver<Value>,
    outgoing: mpsc::UnboundedSender<Message>,
    task: JoinHandle<()>,
}

impl RemoteEnd {
    /// Binds the listener. The client may connect at any time after.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("ws://{}", listener.local_addr()?);

        let (received_tx, received) = mpsc::unbounded_channel();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();

        let task = tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(ws) = accept_async(stream).await else {
                return;
            };
            let (mut sink, mut source) = ws.split();

            loop {
                tokio::select! {
                    message = source.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            if let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) {
                                let _ = received_tx.send(frame);
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(_)) | None => break,
                    },
                    Some(message) = outgoing_rx.recv() => {
                        if sink.send(message).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            url,
            received,
            outgoing,
            task,
        })
    }

    /// `ws://` URL of the listener.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for the next command frame the client sent.
    pub async fn next_command(&mut self) -> anyhow::Result<Value> {
        tokio::time::timeout(TEST_WAIT, self.received.recv())
            .await
            .context("no command frame within the test wait")?
            .ok_or_else(|| anyhow!("remote end stopped"))
    }

    /// Waits for the next command frame and returns its `id`.
    pub async fn next_command_id(&mut self) -> anyhow::Result<u64> {
        let frame = self.next_command().await?;
        frame["id"]
            .as_u64()
            .ok_or_else(|| anyhow!("command frame without integer id: {frame}"))
    }

    /// Writes raw text to the client.
    pub fn send(&self, text: impl Into<String>) -> anyhow::Result<()> {
        let text: String = text.into();
        self.outgoing
            .send(Message::Text(text.into()))
            .map_err(|_| anyhow!("remote end stopped"))
    }

    /// Answers command `id` with `{"value": value}`.
    pub fn reply_value(&self, id: u64, value: &str) -> anyhow::Result<()> {
        let frame = serde_json::json!({
            "type": "success",
            "id": id,
            "result": { "value": value },
        });
        self.send(frame.to_string())
    }

    /// Starts the close handshake from the remote side.
    pub fn close(&self) -> anyhow::Result<()> {
        self.outgoing
            .send(Message::Close(None))
            .map_err(|_| anyhow!("remote end stopped"))
    }
}

impl Drop for RemoteEnd {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Polls `condition` until it holds or the test wait elapses.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + TEST_WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

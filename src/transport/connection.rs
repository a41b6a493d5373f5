//! WebSocket connection to the remote end.
//!
//! This module owns the duplex socket: it connects (retrying until the
//! startup timeout), writes outbound text, runs the receive loop that
//! raises each complete inbound message as a "data received"
//! notification, and performs the close handshake.
//!
//! # Receive Loop
//!
//! The connection spawns a tokio task that:
//!
//! - Raises every complete, non-empty text message, in arrival order
//! - Acknowledges a peer-initiated close frame
//! - Reports socket faults as log notifications and then terminates
//!
//! Continuation frames are reassembled by tungstenite before they reach
//! the loop, so each `Message::Text` is one whole logical message.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::diagnostics::{LogLevel, LogMessage, emit};
use crate::error::{Error, Result};
use crate::observable::Observable;

use super::options::TransportOptions;

// ============================================================================
// Constants
// ============================================================================

/// Pause between failed connection attempts.
const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Component name on log notifications.
const COMPONENT: &str = "connection";

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// An open socket and the task reading from it.
struct ActiveSocket {
    /// URL the socket is connected to.
    url: Url,
    /// Write half, shared with the receive loop for close acknowledgment.
    writer: Arc<AsyncMutex<WsWriter>>,
    /// Receive loop task.
    receiver: JoinHandle<()>,
}

/// State shared with the receive loop.
#[derive(Default)]
struct ConnectionShared {
    /// `true` while the receive loop runs on an open socket.
    active: AtomicBool,
    /// Raised once per complete inbound message.
    data_received: Observable<String>,
    /// Raised for diagnostics.
    log_message: Observable<LogMessage>,
}

impl ConnectionShared {
    #[inline]
    fn log(&self, level: LogLevel, message: impl Into<String>) {
        emit(&self.log_message, level, COMPONENT, message);
    }

    fn deliver(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.data_received.notify(&text.to_owned());
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Duplex WebSocket connection with retrying connect and graceful close.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`; `send` may be called from many tasks at
/// once, writes are serialized internally.
pub struct Connection {
    /// Time allowed for the socket to open.
    startup_timeout: Duration,
    /// Time allowed for the close handshake.
    shutdown_timeout: Duration,
    /// Serializes `start` and `stop`.
    lifecycle: AsyncMutex<()>,
    /// Open socket, if any.
    socket: Mutex<Option<ActiveSocket>>,
    /// State shared with the receive loop.
    shared: Arc<ConnectionShared>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.url())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Connection - Public API
// ============================================================================

impl Connection {
    /// Creates an unconnected connection using the options' timeouts.
    #[must_use]
    pub fn new(options: &TransportOptions) -> Self {
        Self {
            startup_timeout: options.startup_timeout,
            shutdown_timeout: options.shutdown_timeout,
            lifecycle: AsyncMutex::new(()),
            socket: Mutex::new(None),
            shared: Arc::new(ConnectionShared::default()),
        }
    }

    /// Observers of complete inbound messages.
    #[inline]
    #[must_use]
    pub fn data_received(&self) -> &Observable<String> {
        &self.shared.data_received
    }

    /// Observers of diagnostic messages.
    #[inline]
    #[must_use]
    pub fn log_message(&self) -> &Observable<LogMessage> {
        &self.shared.log_message
    }

    /// Returns `true` while the socket is open and being read.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Returns the URL of the open socket.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.socket
            .lock()
            .as_ref()
            .map(|socket| socket.url.to_string())
    }

    /// Opens the socket and starts the receive loop.
    ///
    /// Failed attempts are retried with a fresh socket until the startup
    /// timeout elapses.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `url` is not a `ws://` or `wss://` URL
    /// - [`Error::Connection`] if a socket is already open
    /// - [`Error::ConnectionTimeout`] if no attempt succeeded in time
    pub async fn start(&self, url: &str) -> Result<()> {
        let url = parse_socket_url(url)?;
        let _lifecycle = self.lifecycle.lock().await;

        let stale = {
            let mut socket = self.socket.lock();
            if let Some(active) = socket.as_ref()
                && self.is_active()
            {
                return Err(Error::connection(format!(
                    "already connected to {}",
                    active.url
                )));
            }
            socket.take()
        };

        // The peer closed this socket; its receive loop has already ended.
        if let Some(ActiveSocket {
            url: previous,
            receiver,
            ..
        }) = stale
        {
            receiver.abort();
            let _ = receiver.await;
            self.shared.log(
                LogLevel::Debug,
                format!("Released socket to {previous} closed by the remote end"),
            );
        }

        let stream = self.connect_with_retry(&url).await?;
        let (writer, reader) = stream.split();
        let writer = Arc::new(AsyncMutex::new(writer));

        self.shared.active.store(true, Ordering::SeqCst);
        let receiver = tokio::spawn(Self::run_receive_loop(
            reader,
            Arc::clone(&writer),
            Arc::clone(&self.shared),
        ));

        self.shared
            .log(LogLevel::Info, format!("Connected to {url}"));

        *self.socket.lock() = Some(ActiveSocket {
            url,
            writer,
            receiver,
        });

        Ok(())
    }

    /// Writes `text` as one complete text message.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the socket is not open
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send(&self, text: String) -> Result<()> {
        let writer = self
            .socket
            .lock()
            .as_ref()
            .map(|socket| Arc::clone(&socket.writer))
            .ok_or(Error::ConnectionClosed)?;

        if !self.is_active() {
            return Err(Error::ConnectionClosed);
        }

        let mut writer = writer.lock().await;
        if let Err(e) = writer.send(Message::Text(text.into())).await {
            self.shared
                .log(LogLevel::Error, format!("Failed to send data: {e}"));
            return Err(e.into());
        }

        Ok(())
    }

    /// Closes the socket gracefully, then cancels the receive loop.
    ///
    /// Sends a close frame and waits up to the shutdown timeout for the
    /// peer's acknowledgment before aborting the loop. A no-op when the
    /// connection is not started.
    pub async fn stop(&self) {
        let _lifecycle = self.lifecycle.lock().await;

        let Some(ActiveSocket {
            url,
            writer,
            mut receiver,
        }) = self.socket.lock().take()
        else {
            return;
        };

        if self.is_active() {
            let close = Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            }));
            let mut writer = writer.lock().await;
            if let Err(e) = writer.send(close).await {
                self.shared
                    .log(LogLevel::Debug, format!("Close frame not sent: {e}"));
            }
        }

        match timeout(self.shutdown_timeout, &mut receiver).await {
            Ok(_) => {
                self.shared
                    .log(LogLevel::Info, format!("Disconnected from {url}"));
            }
            Err(_) => {
                self.shared.log(
                    LogLevel::Warn,
                    format!(
                        "No close acknowledgment from {url} within {}ms, aborting",
                        self.shutdown_timeout.as_millis()
                    ),
                );
                receiver.abort();
            }
        }

        self.shared.active.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// Connection - Internals
// ============================================================================

impl Connection {
    /// Attempts to connect until success or the startup timeout.
    async fn connect_with_retry(&self, url: &Url) -> Result<WsStream> {
        let shared = &self.shared;
        let attempts = async {
            let mut attempt: u32 = 0;
            loop {
                attempt += 1;
                match connect_async(url.as_str()).await {
                    Ok((stream, _)) => return stream,
                    Err(e) => {
                        shared.log(
                            LogLevel::Debug,
                            format!("Connection attempt {attempt} to {url} failed: {e}"),
                        );
                        sleep(RETRY_INTERVAL).await;
                    }
                }
            }
        };

        match timeout(self.startup_timeout, attempts).await {
            Ok(stream) => Ok(stream),
            Err(_) => {
                let timeout_ms = u64::try_from(self.startup_timeout.as_millis()).unwrap_or(u64::MAX);
                shared.log(
                    LogLevel::Error,
                    format!("Could not connect to {url} within {timeout_ms}ms"),
                );
                Err(Error::connection_timeout(timeout_ms))
            }
        }
    }

    /// Reads until the socket closes or faults.
    async fn run_receive_loop(
        mut reader: WsReader,
        writer: Arc<AsyncMutex<WsWriter>>,
        shared: Arc<ConnectionShared>,
    ) {
        while let Some(message) = reader.next().await {
            match message {
                Ok(Message::Text(text)) => shared.deliver(text.as_str()),

                Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                    Ok(text) => shared.deliver(text),
                    Err(e) => {
                        shared.log(
                            LogLevel::Warn,
                            format!("Discarding binary message that is not UTF-8: {e}"),
                        );
                    }
                },

                Ok(Message::Close(frame)) => {
                    shared.log(
                        LogLevel::Debug,
                        format!("Close frame received: {frame:?}"),
                    );
                    // Flushes the close reply tungstenite queued on receipt.
                    if let Err(e) = writer.lock().await.close().await {
                        shared.log(
                            LogLevel::Trace,
                            format!("Close acknowledgment not sent: {e}"),
                        );
                    }
                    break;
                }

                // Ping/pong are answered by tungstenite
                Ok(_) => {}

                Err(e) => {
                    shared.log(
                        LogLevel::Error,
                        format!("Unexpected error receiving data: {e}"),
                    );
                    break;
                }
            }
        }

        shared.active.store(false, Ordering::SeqCst);
        shared.log(LogLevel::Debug, "Receive loop terminated");
    }
}

/// Validates a remote end URL.
fn parse_socket_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| Error::config(format!("Invalid URL '{url}': {e}")))?;

    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(Error::config(format!(
            "Unsupported URL scheme '{other}': expected ws or wss"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================

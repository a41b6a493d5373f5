//! Command correlation and inbound message routing.
//!
//! The [`Transport`] turns a [`Connection`] into a request/response
//! protocol:
//!
//! - Outbound: assigns each command the next identifier, records a pending
//!   command for it, and writes the frame
//! - Inbound: queues every message on a [`Dispatcher`] so they are
//!   classified one at a time, in arrival order, off the socket task
//! - Classification resolves pending commands or raises event, unexpected
//!   error and unknown message notifications
//!
//! # Flow
//!
//! ```text
//! send_command ──► pending set ──► Connection::send ──► remote end
//!                                                          │
//! wait_for_command_complete ◄── resolve ◄── classify ◄── Dispatcher ◄── receive loop
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::diagnostics::{LogLevel, LogMessage, emit};
use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::observable::Observable;
use crate::protocol::{
    CommandFrame, CommandParameters, CommandResponse, CommandSuccess, ErrorResponse,
    EventDecoder, EventEnvelope, EventReceived, EventRegistry, IncomingMessage, SuccessResponse,
    UnknownMessage,
};

use super::connection::Connection;
use super::deadline::millis;
use super::dispatcher::Dispatcher;
use super::options::TransportOptions;
use super::pending::{PendingCommand, PendingCommands};

// ============================================================================
// Constants
// ============================================================================

/// Component name on log notifications.
const COMPONENT: &str = "transport";

// ============================================================================
// MessageRouter
// ============================================================================

/// State touched by inbound classification.
///
/// Owned by the transport and shared with the dispatcher worker.
struct MessageRouter {
    /// In-flight commands.
    pending: PendingCommands,
    /// Wire event name to payload decoder.
    events: EventRegistry,
    /// Raised for each decoded event.
    event_received: Observable<EventReceived>,
    /// Raised for error responses that answer no pending command.
    unexpected_error: Observable<ErrorResponse>,
    /// Raised for messages that cannot be classified or routed.
    unknown_message: Observable<UnknownMessage>,
    /// Raised for diagnostics, including forwarded connection logs.
    log_message: Observable<LogMessage>,
}

impl MessageRouter {
    fn new() -> Self {
        Self {
            pending: PendingCommands::default(),
            events: EventRegistry::new(),
            event_received: Observable::new(),
            unexpected_error: Observable::new(),
            unknown_message: Observable::new(),
            log_message: Observable::new(),
        }
    }

    #[inline]
    fn log(&self, level: LogLevel, message: impl Into<String>) {
        emit(&self.log_message, level, COMPONENT, message);
    }

    /// Classifies one inbound message and routes it.
    fn process_message(&self, text: String) {
        let message = match IncomingMessage::parse(&text) {
            Ok(message) => message,
            Err(e) => {
                self.log(
                    LogLevel::Error,
                    format!("Unexpected error parsing message: {e}"),
                );
                self.raise_unknown(text);
                return;
            }
        };

        let handled = match message {
            IncomingMessage::Success(response) => self.resolve_success(response),
            IncomingMessage::Error(response) => self.resolve_error(response),
            IncomingMessage::Event(envelope) => self.raise_event(envelope),
        };

        if !handled {
            self.raise_unknown(text);
        }
    }

    /// Resolves the pending command a success response answers.
    fn resolve_success(&self, response: SuccessResponse) -> bool {
        let Some(command) = self.pending.get(response.id) else {
            self.log(
                LogLevel::Warn,
                format!("Success response for unknown command {}", response.id),
            );
            return false;
        };

        let outcome = match command.decode(response.result) {
            Ok(result) => Ok(CommandResponse::Success(CommandSuccess::new(
                command.method(),
                result,
                response.additional_data,
            ))),
            Err(e) => {
                self.log(
                    LogLevel::Error,
                    format!(
                        "Response for command {} ({}) does not match its result type: {e}",
                        command.id(),
                        command.method()
                    ),
                );
                Err(Error::Json(e))
            }
        };

        self.complete(&command, outcome);
        true
    }

    /// Resolves the pending command an error response answers, or raises it
    /// as unexpected.
    fn resolve_error(&self, response: ErrorResponse) -> bool {
        let command = response.id.and_then(|id| self.pending.get(id));

        match command {
            Some(command) => self.complete(&command, Ok(CommandResponse::Error(response))),
            None => {
                self.log(
                    LogLevel::Warn,
                    format!(
                        "Unexpected error received: {}: {}",
                        response.error, response.message
                    ),
                );
                self.unexpected_error.notify(&response);
            }
        }

        true
    }

    /// Decodes an event against its registered payload type and raises it.
    fn raise_event(&self, envelope: EventEnvelope) -> bool {
        let Some(decoder) = self.events.decoder(&envelope.method) else {
            self.log(
                LogLevel::Warn,
                format!("Event '{}' has no registered payload type", envelope.method),
            );
            return false;
        };

        match decoder(envelope.params) {
            Ok(payload) => {
                self.event_received.notify(&EventReceived {
                    name: envelope.method,
                    payload,
                    additional_data: envelope.additional_data,
                });
                true
            }
            Err(e) => {
                self.log(
                    LogLevel::Error,
                    format!("Unexpected error decoding event '{}': {e}", envelope.method),
                );
                false
            }
        }
    }

    fn complete(&self, command: &PendingCommand, outcome: Result<CommandResponse>) {
        if !command.resolve(outcome) {
            self.log(
                LogLevel::Warn,
                format!(
                    "Ignoring late response for command {}: already resolved",
                    command.id()
                ),
            );
        }
    }

    fn raise_unknown(&self, message: String) {
        self.unknown_message.notify(&UnknownMessage { message });
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Shared transport state.
struct TransportInner {
    /// Timeouts.
    options: TransportOptions,
    /// Last identifier handed out.
    next_id: AtomicU64,
    /// Socket.
    connection: Connection,
    /// Queue between the receive loop and classification.
    dispatcher: Dispatcher<String>,
    /// Pending commands, event registry, observers.
    router: Arc<MessageRouter>,
}

/// Protocol transport: identifiers, pending commands and classification.
///
/// Cloning yields another handle to the same transport.
///
/// # Note
///
/// Call [`Transport::disconnect`] before dropping the last handle. Dropping a
/// connected transport does not close the socket: the receive loop and the
/// dispatcher worker keep running until the remote end closes.
///
/// # Example
///
/// ```ignore
/// let transport = Transport::new(TransportOptions::default());
/// transport.connect("ws://127.0.0.1:9222/session").await?;
///
/// let response = transport.send_command_and_wait(&params).await?;
/// transport.disconnect().await;
/// ```
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("connection", &self.inner.connection)
            .field("pending", &self.pending_count())
            .field("events", &self.inner.router.events)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Transport - Lifecycle
// ============================================================================

impl Transport {
    /// Creates a disconnected transport.
    #[must_use]
    pub fn new(options: TransportOptions) -> Self {
        let router = Arc::new(MessageRouter::new());
        let connection = Connection::new(&options);

        let classifier = Arc::clone(&router);
        let dispatcher = Dispatcher::new("inbound-messages", move |text: String| {
            classifier.process_message(text);
        });

        let queue = dispatcher.clone();
        let overflow = Arc::clone(&router);
        connection.data_received().add_observer(move |text: &String| {
            if !queue.try_dispatch(text.clone()) {
                overflow.log(
                    LogLevel::Warn,
                    "Dropping message received while the dispatcher is stopped",
                );
            }
        });

        let forward = Arc::clone(&router);
        connection
            .log_message()
            .add_observer(move |message: &LogMessage| forward.log_message.notify(message));

        Self {
            inner: Arc::new(TransportInner {
                options,
                next_id: AtomicU64::new(0),
                connection,
                dispatcher,
                router,
            }),
        }
    }

    /// Starts message dispatch and opens the socket.
    ///
    /// # Errors
    ///
    /// Propagates connection failures from [`Connection::start`].
    pub async fn connect(&self, url: &str) -> Result<()> {
        let started = self.inner.dispatcher.start();

        if let Err(e) = self.inner.connection.start(url).await {
            if started {
                self.inner.dispatcher.stop_dispatching().await;
            }
            return Err(e);
        }

        Ok(())
    }

    /// Closes the socket, then drains and stops message dispatch.
    ///
    /// A no-op when already disconnected.
    pub async fn disconnect(&self) {
        self.inner.connection.stop().await;
        self.inner.dispatcher.stop_dispatching().await;
    }

    /// Returns `true` while the socket is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_active()
    }

    /// Returns the configured options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &TransportOptions {
        &self.inner.options
    }

    /// Returns the number of commands awaiting consumption.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.router.pending.len()
    }
}

// ============================================================================
// Transport - Commands
// ============================================================================

impl Transport {
    /// Sends a command and returns its identifier without waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::Invariant`] if the identifier is already pending
    /// - [`Error::Json`] if the parameters fail to serialize
    /// - [`Error::ConnectionClosed`] / [`Error::WebSocket`] if the write fails
    pub async fn send_command<P: CommandParameters>(&self, params: &P) -> Result<CommandId> {
        let (id, frame) = self.begin_command(params)?;

        if let Err(e) = self.inner.connection.send(frame).await {
            self.inner.router.pending.remove(id);
            return Err(e);
        }

        tracing::trace!(command_id = %id, method = params.method_name(), "Command sent");
        Ok(id)
    }

    /// Waits until the command's outcome is available.
    ///
    /// `None` waits without limit. On timeout the command stays pending with
    /// the timeout recorded as its failure, so `get_command_response` still
    /// resolves it.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommandId`] if `id` is not pending
    /// - [`Error::CommandTimeout`] if `limit` elapsed first
    pub async fn wait_for_command_complete(
        &self,
        id: CommandId,
        limit: Option<Duration>,
    ) -> Result<()> {
        let command = self
            .inner
            .router
            .pending
            .get(id)
            .ok_or_else(|| Error::unknown_command_id(id))?;

        if command.wait(limit).await {
            return Ok(());
        }

        let timeout_ms = millis(limit);
        if !command.resolve(Err(Error::command_timeout(id, timeout_ms))) {
            // The response won the race against the deadline.
            return Ok(());
        }

        Err(Error::command_timeout(id, timeout_ms))
    }

    /// Removes the command and returns its outcome.
    ///
    /// # Errors
    ///
    /// - [`Error::Invariant`] if `id` is not pending or has no outcome yet
    /// - The captured failure, if the command failed
    pub fn get_command_response(&self, id: CommandId) -> Result<CommandResponse> {
        let command = self.inner.router.pending.remove(id).ok_or_else(|| {
            self.invariant(format!("no pending command with id {id} to take a response from"))
        })?;

        command.take_outcome().unwrap_or_else(|| {
            Err(self.invariant(format!(
                "command {id} ({}) has neither a result nor a failure",
                command.method()
            )))
        })
    }

    /// Sends a command and waits, up to the configured command timeout, for
    /// its outcome.
    ///
    /// # Errors
    ///
    /// Any error of [`Transport::send_command`],
    /// [`Transport::wait_for_command_complete`] or
    /// [`Transport::get_command_response`].
    pub async fn send_command_and_wait<P: CommandParameters>(
        &self,
        params: &P,
    ) -> Result<CommandResponse> {
        self.send_command_and_wait_with_timeout(params, self.inner.options.command_timeout)
            .await
    }

    /// Like [`Transport::send_command_and_wait`] with an explicit limit.
    /// `None` waits without limit.
    ///
    /// # Errors
    ///
    /// See [`Transport::send_command_and_wait`].
    pub async fn send_command_and_wait_with_timeout<P: CommandParameters>(
        &self,
        params: &P,
        limit: Option<Duration>,
    ) -> Result<CommandResponse> {
        let id = self.send_command(params).await?;

        if let Err(e) = self.wait_for_command_complete(id, limit).await {
            return Err(self.abandon_wait(id, e));
        }

        self.get_command_response(id)
    }

    /// Reserves an identifier, registers the pending command and serializes
    /// the frame.
    fn begin_command<P: CommandParameters>(&self, params: &P) -> Result<(CommandId, String)> {
        let id = CommandId::new(self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let command = Arc::new(PendingCommand::new::<P::Result>(id, params.method_name()));

        if !self.inner.router.pending.try_insert(command) {
            return Err(self.invariant(format!("command id {id} is already pending")));
        }

        match CommandFrame::new(id, params).to_json() {
            Ok(frame) => Ok((id, frame)),
            Err(e) => {
                self.inner.router.pending.remove(id);
                Err(e)
            }
        }
    }

    /// Releases the entry of a wait that failed, returning the wait's error.
    ///
    /// Only a timed-out entry is still pending and owned by this caller.
    fn abandon_wait(&self, id: CommandId, error: Error) -> Error {
        if error.is_timeout() {
            let _ = self.get_command_response(id);
        }
        error
    }

    fn invariant(&self, message: String) -> Error {
        self.inner.router.log(LogLevel::Error, message.clone());
        Error::invariant(message)
    }
}

// ============================================================================
// Transport - Events & Observers
// ============================================================================

impl Transport {
    /// Registers `T` as the payload type of the wire event `name`.
    ///
    /// Until a name is registered, messages carrying it are raised as
    /// unknown messages.
    pub fn register_event_message<T>(&self, name: impl Into<String>)
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.inner.router.events.register::<T>(name);
    }

    /// Registers a caller-supplied payload decoder for `name`.
    pub fn register_event_decoder(&self, name: impl Into<String>, decoder: EventDecoder) {
        self.inner.router.events.register_decoder(name, decoder);
    }

    /// Observers of decoded events.
    #[inline]
    #[must_use]
    pub fn event_received(&self) -> &Observable<EventReceived> {
        &self.inner.router.event_received
    }

    /// Observers of error responses that answer no pending command.
    #[inline]
    #[must_use]
    pub fn unexpected_error(&self) -> &Observable<ErrorResponse> {
        &self.inner.router.unexpected_error
    }

    /// Observers of messages that could not be classified or routed.
    #[inline]
    #[must_use]
    pub fn unknown_message(&self) -> &Observable<UnknownMessage> {
        &self.inner.router.unknown_message
    }

    /// Observers of diagnostics from the transport and its connection.
    #[inline]
    #[must_use]
    pub fn log_message(&self) -> &Observable<LogMessage> {
        &self.inner.router.log_message
    }
}

// ============================================================================
// Tests
// ============================================================================

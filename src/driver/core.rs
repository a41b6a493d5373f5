//! WebDriver BiDi driver façade.
//!
//! The [`Driver`] owns a [`Transport`] and a registry of protocol modules.
//! It is the single place modules execute typed commands through, and it
//! re-raises transport notifications to its own subscribers.
//!
//! # Example
//!
//! ```no_run
//! use webdriver_bidi::Driver;
//!
//! # async fn example() -> webdriver_bidi::Result<()> {
//! let driver = Driver::builder().build()?;
//! driver.start("ws://127.0.0.1:9222/session").await?;
//!
//! let status = driver.session()?.status().await?;
//! println!("ready: {}", status.ready);
//!
//! driver.stop().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::diagnostics::LogMessage;
use crate::error::{Error, Result};
use crate::modules::session::{SESSION_MODULE, SessionModule};
use crate::observable::Observable;
use crate::protocol::{
    CommandParameters, CommandResponse, ErrorResponse, EventDecoder, EventReceived,
    UnknownMessage,
};
use crate::transport::{Transport, TransportOptions};

use super::builder::DriverBuilder;
use super::module::{Module, WeakDriver};

// ============================================================================
// Types
// ============================================================================

/// Registered module, type-erased.
type ModuleEntry = Arc<dyn Any + Send + Sync>;

/// Driver-level subscriber lists.
///
/// Kept apart from [`DriverInner`] so the transport's forwarding observers
/// do not keep the driver alive.
#[derive(Default)]
struct DriverObservers {
    event_received: Observable<EventReceived>,
    unexpected_error: Observable<ErrorResponse>,
    unknown_message: Observable<UnknownMessage>,
    log_message: Observable<LogMessage>,
}

/// Internal shared state for the driver.
pub(crate) struct DriverInner {
    /// Protocol transport.
    transport: Transport,

    /// Modules keyed by name.
    modules: RwLock<FxHashMap<String, ModuleEntry>>,

    /// Re-raised transport notifications.
    observers: Arc<DriverObservers>,
}

// ============================================================================
// Driver
// ============================================================================

/// WebDriver BiDi client.
///
/// The driver is responsible for:
/// - Connecting to and disconnecting from the remote end
/// - Executing typed commands on behalf of modules
/// - Tracking registered protocol modules
///
/// Cloning yields another handle to the same driver.
///
/// # Note
///
/// Call [`Driver::stop`] before dropping the last handle. Dropping a
/// connected driver does not close the socket: the receive loop and the
/// dispatcher worker keep running until the remote end closes.
#[derive(Clone)]
pub struct Driver {
    /// Shared inner state.
    pub(crate) inner: Arc<DriverInner>,
}

// ============================================================================
// Driver - Display
// ============================================================================

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("transport", &self.inner.transport)
            .field("module_count", &self.module_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Driver - Construction
// ============================================================================

impl Driver {
    /// Creates a configuration builder for the driver.
    #[inline]
    #[must_use]
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// Creates a disconnected driver with the `session` module registered.
    #[must_use]
    pub fn new(options: TransportOptions) -> Self {
        let transport = Transport::new(options);
        let observers = Arc::new(DriverObservers::default());
        Self::forward_notifications(&transport, &observers);

        let driver = Self {
            inner: Arc::new(DriverInner {
                transport,
                modules: RwLock::new(FxHashMap::default()),
                observers,
            }),
        };

        driver.register_module(SessionModule::new(driver.downgrade()));
        driver
    }

    pub(crate) fn from_inner(inner: Arc<DriverInner>) -> Self {
        Self { inner }
    }

    /// Returns a non-owning handle for modules to keep.
    #[inline]
    #[must_use]
    pub fn downgrade(&self) -> WeakDriver {
        WeakDriver::new(&self.inner)
    }

    fn forward_notifications(transport: &Transport, observers: &Arc<DriverObservers>) {
        let target = Arc::clone(observers);
        transport
            .event_received()
            .add_observer(move |event: &EventReceived| target.event_received.notify(event));

        let target = Arc::clone(observers);
        transport
            .unexpected_error()
            .add_observer(move |error: &ErrorResponse| target.unexpected_error.notify(error));

        let target = Arc::clone(observers);
        transport
            .unknown_message()
            .add_observer(move |message: &UnknownMessage| target.unknown_message.notify(message));

        let target = Arc::clone(observers);
        transport
            .log_message()
            .add_observer(move |message: &LogMessage| target.log_message.notify(message));
    }
}

// ============================================================================
// Driver - Lifecycle
// ============================================================================

impl Driver {
    /// Connects to the remote end at `url`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `url` is not a `ws://` or `wss://` URL
    /// - [`Error::ConnectionTimeout`] if the socket did not open in time
    /// - [`Error::Connection`] if already connected
    pub async fn start(&self, url: &str) -> Result<()> {
        self.inner.transport.connect(url).await?;
        info!(url, "Driver connected");
        Ok(())
    }

    /// Disconnects from the remote end. A no-op when not connected.
    pub async fn stop(&self) {
        self.inner.transport.disconnect().await;
        debug!("Driver stopped");
    }

    /// Returns `true` while connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.transport.is_connected()
    }

    /// Returns the transport timeouts.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &TransportOptions {
        self.inner.transport.options()
    }
}

// ============================================================================
// Driver - Commands & Events
// ============================================================================

impl Driver {
    /// Executes a command and returns its typed result, waiting up to the
    /// configured command timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::Remote`] if the remote end answered with an error
    /// - [`Error::CommandTimeout`] if no response arrived in time
    /// - [`Error::Json`] if the result did not match `P::Result`
    /// - Connectivity errors from sending
    pub async fn execute_command<P: CommandParameters>(&self, params: &P) -> Result<P::Result> {
        let limit = self.inner.transport.options().command_timeout;
        self.execute_command_with_timeout(params, limit).await
    }

    /// Like [`Driver::execute_command`] with an explicit limit. `None`
    /// waits without limit.
    ///
    /// # Errors
    ///
    /// See [`Driver::execute_command`].
    pub async fn execute_command_with_timeout<P: CommandParameters>(
        &self,
        params: &P,
        limit: Option<Duration>,
    ) -> Result<P::Result> {
        let response = self
            .inner
            .transport
            .send_command_and_wait_with_timeout(params, limit)
            .await?;

        match response {
            CommandResponse::Success(success) => success.into_result::<P::Result>(),
            CommandResponse::Error(error) => Err(error.into_error()),
        }
    }

    /// Registers `T` as the payload type of the event `name`.
    pub fn register_event<T>(&self, name: impl Into<String>)
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.inner.transport.register_event_message::<T>(name);
    }

    /// Registers a caller-supplied payload decoder for the event `name`.
    pub fn register_event_decoder(&self, name: impl Into<String>, decoder: EventDecoder) {
        self.inner.transport.register_event_decoder(name, decoder);
    }

    /// Subscribers to decoded events.
    #[inline]
    #[must_use]
    pub fn event_received(&self) -> &Observable<EventReceived> {
        &self.inner.observers.event_received
    }

    /// Subscribers to error responses that answer no pending command.
    #[inline]
    #[must_use]
    pub fn unexpected_error(&self) -> &Observable<ErrorResponse> {
        &self.inner.observers.unexpected_error
    }

    /// Subscribers to messages that could not be classified or routed.
    #[inline]
    #[must_use]
    pub fn unknown_message(&self) -> &Observable<UnknownMessage> {
        &self.inner.observers.unknown_message
    }

    /// Subscribers to transport and connection diagnostics.
    #[inline]
    #[must_use]
    pub fn log_message(&self) -> &Observable<LogMessage> {
        &self.inner.observers.log_message
    }
}

// ============================================================================
// Driver - Modules
// ============================================================================

impl Driver {
    /// Registers `module` under its name, replacing any previous entry.
    ///
    /// Returns the shared handle now held by the registry.
    pub fn register_module<M: Module>(&self, module: M) -> Arc<M> {
        let module = Arc::new(module);
        let name = module.name().to_string();

        let entry: ModuleEntry = Arc::clone(&module) as ModuleEntry;
        if self.inner.modules.write().insert(name.clone(), entry).is_some() {
            debug!(module = %name, "Replaced registered module");
        }

        module
    }

    /// Returns the module registered under `name` as a `M`.
    ///
    /// # Errors
    ///
    /// - [`Error::ModuleNotFound`] if nothing is registered under `name`
    /// - [`Error::ModuleType`] if the registered module is not a `M`
    pub fn get_module<M: Module>(&self, name: &str) -> Result<Arc<M>> {
        let entry = self
            .inner
            .modules
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::module_not_found(name))?;

        entry
            .downcast::<M>()
            .map_err(|_| Error::module_type::<M>(name))
    }

    /// Returns the built-in `session` module.
    ///
    /// # Errors
    ///
    /// Fails only if the `session` entry was replaced by another type.
    #[inline]
    pub fn session(&self) -> Result<Arc<SessionModule>> {
        self.get_module::<SessionModule>(SESSION_MODULE)
    }

    /// Returns the number of registered modules.
    #[inline]
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.inner.modules.read().len()
    }
}

// ============================================================================
// Tests
// ============================================================================

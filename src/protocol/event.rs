//! Event payload registry and notification types.
//!
//! Events are decoded by name: a module registers, for each wire event name
//! it understands, a decoder that turns the raw `params` into a typed
//! payload. Events whose name has no decoder are not events as far as the
//! transport is concerned; they surface as [`UnknownMessage`]s.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct LoadParameters { context: String, url: String }
//!
//! driver.register_event::<LoadParameters>("browsingContext.load");
//! driver.event_received().add_observer(|event| {
//!     if let Some(load) = event.payload().downcast_ref::<LoadParameters>() {
//!         println!("loaded {}", load.url);
//!     }
//! });
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::message::AdditionalData;

// ============================================================================
// Types
// ============================================================================

/// Decoder turning raw event `params` into a typed payload.
pub type EventDecoder = Arc<dyn Fn(Value) -> serde_json::Result<EventPayload> + Send + Sync>;

// ============================================================================
// EventPayload
// ============================================================================

/// A decoded event payload whose concrete type is chosen by the registrant.
#[derive(Clone)]
pub struct EventPayload(Arc<dyn Any + Send + Sync>);

impl EventPayload {
    /// Wraps a decoded payload.
    #[inline]
    #[must_use]
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self(Arc::new(payload))
    }

    /// Borrows the payload as `T`, if that is its type.
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns `true` if the payload is a `T`.
    #[inline]
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPayload").finish_non_exhaustive()
    }
}

// ============================================================================
// EventReceived
// ============================================================================

/// A classified, decoded event.
#[derive(Debug, Clone)]
pub struct EventReceived {
    /// Wire event name.
    pub name: String,
    /// Decoded payload.
    pub payload: EventPayload,
    /// Unrecognised top-level fields of the event message.
    pub additional_data: AdditionalData,
}

impl EventReceived {
    /// Returns the module part of the event name.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // name = "browsingContext.load"
    /// assert_eq!(event.module(), "browsingContext");
    /// ```
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        self.name.split('.').next().unwrap_or_default()
    }

    /// Returns the decoded payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }
}

// ============================================================================
// UnknownMessage
// ============================================================================

/// A message that could not be classified or routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMessage {
    /// Raw message text as received.
    pub message: String,
}

// ============================================================================
// EventRegistry
// ============================================================================

/// Map from wire event name to payload decoder.
#[derive(Default)]
pub struct EventRegistry {
    decoders: RwLock<FxHashMap<String, EventDecoder>>,
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decoders = self.decoders.read();
        let mut names: Vec<&String> = decoders.keys().collect();
        names.sort();
        f.debug_struct("EventRegistry").field("events", &names).finish()
    }
}

impl EventRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` as the payload type for `name`.
    ///
    /// Re-registering a name replaces its decoder.
    pub fn register<T>(&self, name: impl Into<String>)
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.register_decoder(name, Arc::new(decode_event::<T>));
    }

    /// Registers a caller-supplied decoder for `name`.
    pub fn register_decoder(&self, name: impl Into<String>, decoder: EventDecoder) {
        self.decoders.write().insert(name.into(), decoder);
    }

    /// Returns `true` if `name` has a decoder.
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.decoders.read().contains_key(name)
    }

    /// Returns the decoder for `name`.
    #[must_use]
    pub fn decoder(&self, name: &str) -> Option<EventDecoder> {
        self.decoders.read().get(name).cloned()
    }
}

/// Decodes raw event params into `T`.
fn decode_event<T>(params: Value) -> serde_json::Result<EventPayload>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let payload: T = serde_json::from_value(params)?;
    Ok(EventPayload::new(payload))
}

// ============================================================================
// Tests
// ============================================================================

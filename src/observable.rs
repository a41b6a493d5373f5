//! Multi-subscriber notifications.
//!
//! Every notification the crate raises (data received, event received,
//! unexpected error, unknown message, log message) goes through an
//! [`Observable`]. Handlers run synchronously on the notifying task, in
//! registration order.
//!
//! # Example
//!
//! ```ignore
//! let id = driver.unknown_message().add_observer(|msg| {
//!     eprintln!("unrecognised: {}", msg.message);
//! });
//! driver.unknown_message().remove_observer(id);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::identifiers::ObserverId;

// ============================================================================
// Types
// ============================================================================

/// Observer callback type.
pub type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

// ============================================================================
// Observable
// ============================================================================

/// A thread-safe list of observers for notifications of type `T`.
pub struct Observable<T> {
    /// Registered observers, in registration order.
    observers: RwLock<Vec<(ObserverId, Observer<T>)>>,
    /// Source of observer handles.
    next_id: AtomicU64,
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("observer_count", &self.observer_count())
            .finish()
    }
}

impl<T> Observable<T> {
    /// Creates an observable with no observers.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers an observer and returns a handle for removing it.
    pub fn add_observer<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ObserverId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.observers.write().push((id, Arc::new(observer)));
        id
    }

    /// Removes an observer.
    ///
    /// Returns `false` if the handle was not registered here.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Returns the number of registered observers.
    #[inline]
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Invokes every observer with `value`.
    ///
    /// Works on a snapshot, so observers may register or remove observers
    /// from inside the callback.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Observer<T>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in snapshot {
            observer(value);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

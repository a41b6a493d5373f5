//! Protocol modules and the weak driver handle they hold.
//!
//! A module groups the commands and events of one protocol domain
//! (`session`, `browsingContext`, ...). Modules are registered on the
//! [`Driver`] by name and talk to the remote end only through
//! [`Driver::execute_command`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};

use super::core::{Driver, DriverInner};

// ============================================================================
// Module
// ============================================================================

/// A named protocol module.
///
/// # Example
///
/// ```ignore
/// struct LogModule {
///     driver: WeakDriver,
/// }
///
/// impl Module for LogModule {
///     fn name(&self) -> &str {
///         "log"
///     }
/// }
/// ```
pub trait Module: Send + Sync + 'static {
    /// Registry key, usually the protocol domain name.
    fn name(&self) -> &str;
}

// ============================================================================
// WeakDriver
// ============================================================================

/// Non-owning handle to a [`Driver`].
///
/// Modules keep one of these so the registry does not form a reference
/// cycle with the driver that owns it.
#[derive(Clone, Default)]
pub struct WeakDriver {
    inner: Weak<DriverInner>,
}

impl fmt::Debug for WeakDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDriver")
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl WeakDriver {
    pub(crate) fn new(inner: &Arc<DriverInner>) -> Self {
        Self {
            inner: Arc::downgrade(inner),
        }
    }

    /// Returns the driver if it is still alive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverReleased`] once every [`Driver`] handle has
    /// been dropped.
    pub fn upgrade(&self) -> Result<Driver> {
        self.inner
            .upgrade()
            .map(Driver::from_inner)
            .ok_or(Error::DriverReleased)
    }

    /// Returns `true` while at least one [`Driver`] handle exists.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

// ============================================================================
// Tests
// ============================================================================

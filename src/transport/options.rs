//! Transport timeouts.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use webdriver_bidi::TransportOptions;
//!
//! let options = TransportOptions::new()
//!     .with_startup_timeout(Duration::from_secs(5))
//!     .with_command_timeout(None);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default time allowed for the socket to open.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed for the close handshake.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time a command waits for its response.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// TransportOptions
// ============================================================================

/// Timeouts governing the connection and command waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// How long `start` keeps retrying the connection.
    pub startup_timeout: Duration,

    /// How long `stop` waits for the peer's close acknowledgment.
    pub shutdown_timeout: Duration,

    /// How long a command waits for its response. `None` waits forever.
    pub command_timeout: Option<Duration>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl TransportOptions {
    /// Creates options with the default timeouts.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TransportOptions {
    /// Sets the connection startup timeout.
    #[inline]
    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Sets the close handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the command wait timeout. `None` waits forever.
    #[inline]
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TransportOptions::default();
        assert_eq!(options.startup_timeout, Duration::from_secs(30));
        assert_eq!(options.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(options.command_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_builder_methods() {
        let options = TransportOptions::new()
            .with_startup_timeout(Duration::from_secs(1))
            .with_shutdown_timeout(Duration::from_millis(500))
            .with_command_timeout(None);

        assert_eq!(options.startup_timeout, Duration::from_secs(1));
        assert_eq!(options.shutdown_timeout, Duration::from_millis(500));
        assert_eq!(options.command_timeout, None);
    }
}

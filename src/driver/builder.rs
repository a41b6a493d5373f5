//! Builder pattern for driver configuration.
//!
//! Provides a fluent API for configuring and creating [`Driver`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use webdriver_bidi::Driver;
//!
//! # fn example() -> webdriver_bidi::Result<()> {
//! let driver = Driver::builder()
//!     .startup_timeout(Duration::from_secs(5))
//!     .command_timeout(Duration::from_secs(10))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::TransportOptions;

use super::core::Driver;

// ============================================================================
// DriverBuilder
// ============================================================================

/// Builder for configuring a [`Driver`] instance.
///
/// Use [`Driver::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct DriverBuilder {
    /// Timeouts handed to the transport.
    options: TransportOptions,
}

// ============================================================================
// DriverBuilder Implementation
// ============================================================================

impl DriverBuilder {
    /// Creates a new driver builder with the default timeouts.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long `start` keeps retrying the connection.
    #[inline]
    #[must_use]
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_startup_timeout(timeout);
        self
    }

    /// Sets how long `stop` waits for the close handshake.
    #[inline]
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_shutdown_timeout(timeout);
        self
    }

    /// Sets how long a command waits for its response.
    #[inline]
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_command_timeout(Some(timeout));
        self
    }

    /// Lets commands wait for their response without limit.
    #[inline]
    #[must_use]
    pub fn no_command_timeout(mut self) -> Self {
        self.options = self.options.with_command_timeout(None);
        self
    }

    /// Replaces all timeouts at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the driver with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if any timeout is zero
    pub fn build(self) -> Result<Driver> {
        self.validate_timeouts()?;
        Ok(Driver::new(self.options))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl DriverBuilder {
    /// Rejects zero durations, which would fail every wait immediately.
    fn validate_timeouts(&self) -> Result<()> {
        let options = &self.options;

        if options.startup_timeout.is_zero() {
            return Err(Error::config(
                "Startup timeout must be greater than zero.\n\
                 Example: Driver::builder().startup_timeout(Duration::from_secs(30))",
            ));
        }

        if options.shutdown_timeout.is_zero() {
            return Err(Error::config(
                "Shutdown timeout must be greater than zero.\n\
                 Example: Driver::builder().shutdown_timeout(Duration::from_secs(10))",
            ));
        }

        if options.command_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::config(
                "Command timeout must be greater than zero.\n\
                 Use .no_command_timeout() to wait without limit.",
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_timeouts() {
        let builder = DriverBuilder::new();
        assert_eq!(builder.options, TransportOptions::default());
    }

    #[test]
    fn test_timeouts_set_fluently() {
        let builder = DriverBuilder::new()
            .startup_timeout(Duration::from_secs(1))
            .shutdown_timeout(Duration::from_secs(2))
            .command_timeout(Duration::from_secs(3));

        assert_eq!(builder.options.startup_timeout, Duration::from_secs(1));
        assert_eq!(builder.options.shutdown_timeout, Duration::from_secs(2));
        assert_eq!(builder.options.command_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_no_command_timeout() {
        let builder = DriverBuilder::new().no_command_timeout();
        assert_eq!(builder.options.command_timeout, None);
    }

    #[test]
    fn test_build_applies_options() {
        let driver = DriverBuilder::new()
            .command_timeout(Duration::from_millis(250))
            .build()
            .expect("valid config");

        assert_eq!(
            driver.options().command_timeout,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_build_fails_with_zero_startup_timeout() {
        let result = DriverBuilder::new().startup_timeout(Duration::ZERO).build();

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("Startup timeout"));
    }

    #[test]
    fn test_build_fails_with_zero_shutdown_timeout() {
        let result = DriverBuilder::new().shutdown_timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_build_fails_with_zero_command_timeout() {
        let result = DriverBuilder::new()
            .options(TransportOptions::new().with_command_timeout(Some(Duration::ZERO)))
            .build();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("no_command_timeout"));
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = DriverBuilder::new().no_command_timeout();
        let cloned = builder.clone();
        assert_eq!(builder.options, cloned.options);
    }
}

//! Error types for the WebDriver BiDi client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use webdriver_bidi::{Driver, Result};
//!
//! async fn example(driver: &Driver) -> Result<()> {
//!     let status = driver.session()?.status().await?;
//!     println!("ready: {}", status.ready);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::Remote`] |
//! | Correlation | [`Error::CommandTimeout`], [`Error::UnknownCommandId`], [`Error::Invariant`] |
//! | Typed access | [`Error::ResultType`], [`Error::ModuleNotFound`], [`Error::ModuleType`], [`Error::DriverReleased`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::CommandId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when driver options or the remote URL are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// No connection attempt succeeded within the startup timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The socket is not open.
    ///
    /// Returned when sending before `start` or after `stop`.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or malformed message.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// The remote end answered a command with an error response.
    #[error("Received '{error}' error executing command: {message}")]
    Remote {
        /// Protocol error code (e.g. `unknown command`).
        error: String,
        /// Human-readable message from the remote end.
        message: String,
        /// Remote stack trace, if one was sent.
        stacktrace: Option<String>,
    },

    // ========================================================================
    // Correlation Errors
    // ========================================================================
    /// No response arrived for a command within the wait timeout.
    #[error("Timed out after {timeout_ms}ms waiting for command {command_id}")]
    CommandTimeout {
        /// The command that timed out.
        command_id: CommandId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// No pending command exists for the identifier.
    #[error("Unknown command id: {command_id}")]
    UnknownCommandId {
        /// The identifier that was looked up.
        command_id: CommandId,
    },

    /// The command correlation engine reached an impossible state.
    #[error("Invariant violated: {message}")]
    Invariant {
        /// Description of the violated invariant.
        message: String,
    },

    // ========================================================================
    // Typed Access Errors
    // ========================================================================
    /// A command result could not be viewed as the requested type.
    #[error("Result of '{method}' cannot be viewed as {expected}")]
    ResultType {
        /// Method of the command that produced the result.
        method: String,
        /// Requested Rust type name.
        expected: &'static str,
    },

    /// No module is registered under the name.
    #[error("Module not found: {name}")]
    ModuleNotFound {
        /// The requested module name.
        name: String,
    },

    /// A module is registered under the name, but with another type.
    #[error("Module '{name}' is not a {expected}")]
    ModuleType {
        /// The requested module name.
        name: String,
        /// Requested Rust type name.
        expected: &'static str,
    },

    /// A module outlived the driver it was registered with.
    #[error("Driver has been dropped")]
    DriverReleased,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a remote error from an error response.
    #[inline]
    pub fn remote(
        error: impl Into<String>,
        message: impl Into<String>,
        stacktrace: Option<String>,
    ) -> Self {
        Self::Remote {
            error: error.into(),
            message: message.into(),
            stacktrace,
        }
    }

    /// Creates a command timeout error.
    #[inline]
    pub fn command_timeout(command_id: CommandId, timeout_ms: u64) -> Self {
        Self::CommandTimeout {
            command_id,
            timeout_ms,
        }
    }

    /// Creates an unknown command id error.
    #[inline]
    pub fn unknown_command_id(command_id: CommandId) -> Self {
        Self::UnknownCommandId { command_id }
    }

    /// Creates an invariant violation error.
    #[inline]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// Creates a result type mismatch error.
    #[inline]
    pub fn result_type<T>(method: impl Into<String>) -> Self {
        Self::ResultType {
            method: method.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Creates a module not found error.
    #[inline]
    pub fn module_not_found(name: impl Into<String>) -> Self {
        Self::ModuleNotFound { name: name.into() }
    }

    /// Creates a module type mismatch error.
    #[inline]
    pub fn module_type<T>(name: impl Into<String>) -> Self {
        Self::ModuleType {
            name: name.into(),
            expected: std::any::type_name::<T>(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::CommandTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the remote end rejected the command.
    #[inline]
    #[must_use]
    pub fn is_remote_error(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns `true` if this error indicates a bug in the correlation engine.
    #[inline]
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Invariant { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

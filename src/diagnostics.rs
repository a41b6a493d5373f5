//! Diagnostic log notifications.
//!
//! Components log through `tracing` and, at the same time, raise a
//! [`LogMessage`] notification so embedders without a `tracing` subscriber
//! can still observe what the transport is doing.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{debug, error, info, trace, warn};

use crate::observable::Observable;

// ============================================================================
// LogLevel
// ============================================================================

/// Severity of a [`LogMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Very verbose tracing output.
    Trace,
    /// Debugging output.
    Debug,
    /// Informational output.
    Info,
    /// Something unexpected that was tolerated.
    Warn,
    /// A failure that was caught and reported.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

// ============================================================================
// LogMessage
// ============================================================================

/// A diagnostic message raised by the connection or transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /// Severity.
    pub level: LogLevel,
    /// Component that raised the message (`connection`, `transport`).
    pub component: &'static str,
    /// Message text.
    pub message: String,
}

// ============================================================================
// Emission
// ============================================================================

/// Logs through `tracing` and notifies `sink` observers.
pub(crate) fn emit(
    sink: &Observable<LogMessage>,
    level: LogLevel,
    component: &'static str,
    message: impl Into<String>,
) {
    let message = message.into();

    match level {
        LogLevel::Trace => trace!(component, "{message}"),
        LogLevel::Debug => debug!(component, "{message}"),
        LogLevel::Info => info!(component, "{message}"),
        LogLevel::Warn => warn!(component, "{message}"),
        LogLevel::Error => error!(component, "{message}"),
    }

    sink.notify(&LogMessage {
        level,
        component,
        message,
    });
}

// ============================================================================
// Tests
// ============================================================================

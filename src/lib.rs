//! WebDriver BiDi client - transport core and driver façade.
//!
//! This library drives a remote browser over the WebDriver BiDi protocol:
//! JSON messages over a single WebSocket, with typed commands awaiting typed
//! results while the remote end pushes events asynchronously.
//!
//! # Architecture
//!
//! The client follows a local end / remote end model:
//!
//! - **Local End (Rust)**: Sends commands, receives responses and events
//! - **Remote End (Browser)**: Executes commands, emits events
//!
//! Key design principles:
//!
//! - One [`Driver`] owns one [`Transport`] which owns one socket
//! - Protocol uses `module.methodName` format
//! - Inbound messages are classified strictly in arrival order
//! - Many commands may be in flight; each resolves independently
//!
//! # Quick Start
//!
//! ```no_run
//! use webdriver_bidi::{Driver, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let driver = Driver::builder().build()?;
//!     driver.start("ws://127.0.0.1:9222/session").await?;
//!
//!     let status = driver.session()?.status().await?;
//!     println!("ready: {} ({})", status.ready, status.message);
//!
//!     driver.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`driver`] | Driver façade, builder and module registry |
//! | [`modules`] | Protocol modules built on the driver |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`observable`] | Multi-subscriber notifications |
//! | [`diagnostics`] | Log notifications |
//! | [`protocol`] | Wire message types |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Log levels and log notifications.
pub mod diagnostics;

/// Driver façade and configuration.
///
/// Use [`Driver::builder()`] to create a configured driver instance.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Protocol modules.
pub mod modules;

/// Multi-subscriber notification primitive.
pub mod observable;

/// WebDriver BiDi wire message types.
pub mod protocol;

/// WebSocket transport layer.
///
/// Connection, ordered dispatch and command correlation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Diagnostics
pub use diagnostics::{LogLevel, LogMessage};

// Driver types
pub use driver::{Driver, DriverBuilder, Module, WeakDriver};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CommandId, ObserverId};

// Modules
pub use modules::SessionModule;

// Observers
pub use observable::Observable;

// Protocol types
pub use protocol::{
    AdditionalData, CommandParameters, CommandResponse, CommandSuccess, EmptyResult,
    ErrorResponse, EventPayload, EventReceived, UnknownMessage,
};

// Transport types
pub use transport::{Transport, TransportOptions};

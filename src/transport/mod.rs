//! WebSocket transport layer.
//!
//! This module carries protocol frames between the local end (Rust) and a
//! remote WebDriver BiDi end over a WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐                        ┌─────────────────┐
//! │  Transport               │                        │  Remote end     │
//! │  ids, pending commands,  │       WebSocket        │  (browser)      │
//! │  classification          │◄──────────────────────►│                 │
//! │   ├─ Dispatcher<String>  │      ws:// / wss://    │  BiDi server    │
//! │   └─ Connection          │                        │                 │
//! └──────────────────────────┘                        └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::new` - Wire the connection to the dispatcher
//! 2. `Transport::connect` - Start dispatch, open the socket (with retry)
//! 3. `Transport::send_command` / `wait_for_command_complete` - Exchange frames
//! 4. `Transport::disconnect` - Close handshake, drain dispatch
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket client and receive loop |
//! | `core` | Command correlation and message classification |
//! | `dispatcher` | Ordered background delivery |
//! | `options` | Timeouts |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket client and receive loop.
pub mod connection;

/// Command correlation and message classification.
pub mod core;

/// Ordered background delivery.
pub mod dispatcher;

/// Transport timeouts.
pub mod options;

mod deadline;
mod pending;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use core::Transport;
pub use dispatcher::{DispatchHandler, Dispatcher};
pub use options::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_STARTUP_TIMEOUT, TransportOptions,
};

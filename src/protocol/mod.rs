//! WebDriver BiDi message types.
//!
//! This module defines the message formats exchanged with the remote end
//! and the typing glue between raw JSON and module-level Rust types.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Shape |
//! |---------|-----------|-------|
//! | Command | Local → Remote | `{"id", "method", "params"}` |
//! | Success | Remote → Local | `{"type": "success", "id", "result"}` |
//! | Error | Remote → Local | `{"type": "error", "id"?, "error", "message"}` |
//! | Event | Remote → Local | `{"type": "event", "method", "params"}` |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command frame, parameters trait, typed outcomes |
//! | `event` | Event registry and notification payloads |
//! | `message` | Inbound message classification |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound commands and typed outcomes.
pub mod command;

/// Event registry and notification types.
pub mod event;

/// Inbound message classification.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{CommandFrame, CommandParameters, CommandResponse, CommandSuccess, EmptyResult};
pub use event::{EventDecoder, EventPayload, EventReceived, EventRegistry, UnknownMessage};
pub use message::{AdditionalData, ErrorResponse, EventEnvelope, IncomingMessage, SuccessResponse};

//! Inbound message classification.
//!
//! Every text frame from the remote end is one JSON object. The `type`
//! field discriminates it:
//!
//! | `type` | Kind | Required fields |
//! |--------|------|-----------------|
//! | `success` | Command success | `id`, `result` |
//! | `error` | Command error / out-of-band error | `error`, `message` (`id` may be null) |
//! | anything else | Event | `method` (`params` defaults to `null`) |
//!
//! Without a `type` field the kind is inferred from the shape: an `error`
//! field means error, `id` plus `result` means success, anything else is
//! treated as an event.
//!
//! Fields a kind does not define are kept as [`AdditionalData`].

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

// ============================================================================
// Types
// ============================================================================

/// Unrecognised top-level fields preserved from a message.
pub type AdditionalData = FxHashMap<String, Value>;

/// Discriminator field name.
const TYPE_FIELD: &str = "type";

// ============================================================================
// IncomingMessage
// ============================================================================

/// A structurally valid inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    /// Response to a command that succeeded.
    Success(SuccessResponse),
    /// Error response, tied to a command or out-of-band.
    Error(ErrorResponse),
    /// Event notification.
    Event(EventEnvelope),
}

impl IncomingMessage {
    /// Parses and classifies raw message text.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not valid JSON
    /// - [`Error::Protocol`] if it is not an object or lacks the fields its
    ///   kind requires
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut object) = value else {
            return Err(Error::protocol("message is not a JSON object"));
        };

        let kind = match object.remove(TYPE_FIELD) {
            Some(Value::String(kind)) => kind,
            Some(other) => {
                return Err(Error::protocol(format!(
                    "message type must be a string, got {other}"
                )));
            }
            None => infer_kind(&object).to_string(),
        };

        match kind.as_str() {
            "success" => Ok(Self::Success(decode_body(object, "success")?)),
            "error" => Ok(Self::Error(decode_body(object, "error")?)),
            _ => Ok(Self::Event(decode_body(object, "event")?)),
        }
    }
}

/// Infers the kind of a message that carries no `type` field.
fn infer_kind(object: &Map<String, Value>) -> &'static str {
    if object.contains_key("error") {
        "error"
    } else if object.contains_key("id") && object.contains_key("result") {
        "success"
    } else {
        "event"
    }
}

/// Decodes the remaining fields of a message into its kind's shape.
fn decode_body<T: DeserializeOwned>(object: Map<String, Value>, kind: &str) -> Result<T> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| Error::protocol(format!("malformed {kind} message: {e}")))
}

// ============================================================================
// SuccessResponse
// ============================================================================

/// A success response before its result is decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuccessResponse {
    /// Identifier of the originating command.
    pub id: CommandId,
    /// Raw result payload.
    pub result: Value,
    /// Unrecognised top-level fields.
    #[serde(flatten)]
    pub additional_data: AdditionalData,
}

// ============================================================================
// ErrorResponse
// ============================================================================

/// An error response from the remote end.
///
/// `id` is `None` for out-of-band errors that answer no particular command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorResponse {
    /// Identifier of the originating command, if any.
    #[serde(default)]
    pub id: Option<CommandId>,
    /// Protocol error code.
    pub error: String,
    /// Human-readable description.
    pub message: String,
    /// Remote stack trace.
    #[serde(default)]
    pub stacktrace: Option<String>,
    /// Unrecognised top-level fields.
    #[serde(flatten)]
    pub additional_data: AdditionalData,
}

impl ErrorResponse {
    /// Converts the response into a crate [`Error::Remote`].
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::remote(self.error, self.message, self.stacktrace)
    }
}

// ============================================================================
// EventEnvelope
// ============================================================================

/// An event message before its payload is decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventEnvelope {
    /// Event name in `module.eventName` form.
    pub method: String,
    /// Raw event payload.
    #[serde(default)]
    pub params: Value,
    /// Unrecognised top-level fields.
    #[serde(flatten)]
    pub additional_data: AdditionalData,
}

// ============================================================================
// Tests
// ============================================================================

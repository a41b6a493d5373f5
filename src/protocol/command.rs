//! Outbound commands and their typed outcomes.
//!
//! Modules describe a command by implementing [`CommandParameters`]; the
//! transport wraps it in a [`CommandFrame`] for the wire and later hands
//! back a [`CommandResponse`].
//!
//! # Format
//!
//! ```json
//! { "id": 1, "method": "module.command", "params": { ... } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::message::{AdditionalData, ErrorResponse};

// ============================================================================
// CommandParameters
// ============================================================================

/// Parameters of a protocol command.
///
/// The serialized form of `self` becomes the frame's `params` object, and
/// [`CommandParameters::Result`] is the shape the `result` of a matching
/// success response is decoded into.
///
/// # Example
///
/// ```ignore
/// #[derive(Serialize)]
/// struct NavigateParameters { context: String, url: String }
///
/// impl CommandParameters for NavigateParameters {
///     type Result = NavigateResult;
///     fn method_name(&self) -> &str { "browsingContext.navigate" }
/// }
/// ```
pub trait CommandParameters: Serialize + Send + Sync {
    /// Decoded type of the command's result.
    type Result: DeserializeOwned + Send + 'static;

    /// Method name in `module.command` form.
    fn method_name(&self) -> &str;
}

// ============================================================================
// CommandFrame
// ============================================================================

/// A command as written to the socket.
#[derive(Debug, Serialize)]
pub struct CommandFrame<'a, P: Serialize> {
    /// Correlation identifier.
    pub id: CommandId,
    /// Method name in `module.command` form.
    pub method: &'a str,
    /// Command parameters.
    pub params: &'a P,
}

impl<'a, P: CommandParameters> CommandFrame<'a, P> {
    /// Creates a frame for `params` under `id`.
    #[inline]
    #[must_use]
    pub fn new(id: CommandId, params: &'a P) -> Self {
        Self {
            id,
            method: params.method_name(),
            params,
        }
    }

    /// Serializes the frame to wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the parameters fail to serialize.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// EmptyResult
// ============================================================================

/// Result of commands whose success payload is an empty object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmptyResult {
    /// Any fields the remote end sent anyway.
    #[serde(flatten)]
    pub additional_data: AdditionalData,
}

// ============================================================================
// CommandResponse
// ============================================================================

/// Outcome of a command as resolved by the transport.
#[derive(Debug)]
pub enum CommandResponse {
    /// The remote end returned a result.
    Success(CommandSuccess),
    /// The remote end returned an error response for this command.
    Error(ErrorResponse),
}

impl CommandResponse {
    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

// ============================================================================
// CommandSuccess
// ============================================================================

/// A decoded success result whose type is known only to the caller.
pub struct CommandSuccess {
    /// Method of the originating command.
    method: String,
    /// Result decoded into the command's `Result` type.
    result: Box<dyn Any + Send>,
    /// Unrecognised top-level fields of the response.
    additional_data: AdditionalData,
}

impl fmt::Debug for CommandSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSuccess")
            .field("method", &self.method)
            .field("additional_data", &self.additional_data)
            .finish_non_exhaustive()
    }
}

impl CommandSuccess {
    pub(crate) fn new(
        method: impl Into<String>,
        result: Box<dyn Any + Send>,
        additional_data: AdditionalData,
    ) -> Self {
        Self {
            method: method.into(),
            result,
            additional_data,
        }
    }

    /// Returns the method of the originating command.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the response's unrecognised top-level fields.
    #[inline]
    #[must_use]
    pub fn additional_data(&self) -> &AdditionalData {
        &self.additional_data
    }

    /// Borrows the result as `T`, if that is its type.
    #[inline]
    #[must_use]
    pub fn result_ref<T: 'static>(&self) -> Option<&T> {
        self.result.downcast_ref::<T>()
    }

    /// Takes the result as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResultType`] if the result is not a `T`.
    pub fn into_result<T: 'static>(self) -> Result<T> {
        match self.result.downcast::<T>() {
            Ok(result) => Ok(*result),
            Err(_) => Err(Error::result_type::<T>(self.method)),
        }
    }
}

/// Decodes a raw `result` object into `T`, erasing the type.
pub(crate) fn decode_result<T>(value: Value) -> serde_json::Result<Box<dyn Any + Send>>
where
    T: DeserializeOwned + Send + 'static,
{
    let result: T = serde_json::from_value(value)?;
    Ok(Box::new(result))
}

// ============================================================================
// Tests
// ============================================================================

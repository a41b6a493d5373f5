//! Pending command records.
//!
//! A [`PendingCommand`] exists from the moment a command starts sending
//! until its outcome is consumed. It carries the decoder for the command's
//! result type and a one-shot completion signal; its outcome is set exactly
//! once.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::Result;
use crate::identifiers::CommandId;
use crate::protocol::CommandResponse;
use crate::protocol::command::decode_result;

use super::deadline::within;

// ============================================================================
// Types
// ============================================================================

/// Decoder from a raw `result` object to the command's result type.
pub(crate) type ResultDecoder = fn(Value) -> serde_json::Result<Box<dyn Any + Send>>;

// ============================================================================
// PendingCommand
// ============================================================================

/// Correlation record for one in-flight command.
pub(crate) struct PendingCommand {
    /// Command identifier.
    id: CommandId,
    /// Command method, for diagnostics and typed-result errors.
    method: String,
    /// Decoder for the expected result shape.
    decode: ResultDecoder,
    /// Flipped to `true` once the outcome is set.
    completed: watch::Sender<bool>,
    /// The result or failure, until taken.
    outcome: Mutex<Option<Result<CommandResponse>>>,
}

impl fmt::Debug for PendingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCommand")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl PendingCommand {
    /// Creates an unresolved record expecting a result of type `R`.
    pub(crate) fn new<R>(id: CommandId, method: impl Into<String>) -> Self
    where
        R: DeserializeOwned + Send + 'static,
    {
        let (completed, _) = watch::channel(false);
        Self {
            id,
            method: method.into(),
            decode: decode_result::<R>,
            completed,
            outcome: Mutex::new(None),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> CommandId {
        self.id
    }

    #[inline]
    pub(crate) fn method(&self) -> &str {
        &self.method
    }

    /// Decodes a raw result into the expected shape.
    #[inline]
    pub(crate) fn decode(&self, result: Value) -> serde_json::Result<Box<dyn Any + Send>> {
        (self.decode)(result)
    }

    /// Returns `true` once an outcome has been set.
    #[inline]
    pub(crate) fn is_resolved(&self) -> bool {
        *self.completed.borrow()
    }

    /// Sets the outcome and fires the completion signal.
    ///
    /// Returns `false`, leaving the first outcome in place, if the command
    /// was already resolved.
    pub(crate) fn resolve(&self, outcome: Result<CommandResponse>) -> bool {
        let mut slot = self.outcome.lock();
        if self.is_resolved() {
            return false;
        }

        *slot = Some(outcome);
        drop(slot);

        self.completed.send_replace(true);
        true
    }

    /// Waits for the completion signal.
    ///
    /// Returns `false` if `limit` elapsed first.
    pub(crate) async fn wait(&self, limit: Option<Duration>) -> bool {
        let mut completed = self.completed.subscribe();
        within(limit, async move { completed.wait_for(|done| *done).await.is_ok() })
            .await
            .unwrap_or(false)
    }

    /// Takes the outcome, leaving nothing behind.
    pub(crate) fn take_outcome(&self) -> Option<Result<CommandResponse>> {
        self.outcome.lock().take()
    }
}

// ============================================================================
// PendingCommands
// ============================================================================

/// Thread-safe set of in-flight commands keyed by identifier.
///
/// Mutation is limited to insert-if-absent and remove-and-return.
#[derive(Debug, Default)]
pub(crate) struct PendingCommands {
    commands: Mutex<FxHashMap<CommandId, Arc<PendingCommand>>>,
}

impl PendingCommands {
    /// Inserts `command` unless its identifier is already present.
    ///
    /// Returns `false` if the identifier was taken.
    pub(crate) fn try_insert(&self, command: Arc<PendingCommand>) -> bool {
        let mut commands = self.commands.lock();
        if commands.contains_key(&command.id()) {
            return false;
        }
        commands.insert(command.id(), command);
        true
    }

    /// Returns the command registered under `id`.
    pub(crate) fn get(&self, id: CommandId) -> Option<Arc<PendingCommand>> {
        self.commands.lock().get(&id).cloned()
    }

    /// Removes and returns the command registered under `id`.
    pub(crate) fn remove(&self, id: CommandId) -> Option<Arc<PendingCommand>> {
        self.commands.lock().remove(&id)
    }

    /// Returns the number of in-flight commands.
    pub(crate) fn len(&self) -> usize {
        self.commands.lock().len()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! `session` protocol module.
//!
//! | Command | Parameters | Result |
//! |---------|------------|--------|
//! | `session.status` | [`StatusParameters`] | [`StatusResult`] |
//! | `session.subscribe` | [`SubscribeParameters`] | [`SubscribeResult`] |
//! | `session.unsubscribe` | [`UnsubscribeParameters`] | [`EmptyResult`] |
//! | `session.end` | [`EndParameters`] | [`EmptyResult`] |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::driver::{Module, WeakDriver};
use crate::error::Result;
use crate::protocol::{AdditionalData, CommandParameters, EmptyResult};

// ============================================================================
// Constants
// ============================================================================

/// Registry name of the session module.
pub const SESSION_MODULE: &str = "session";

// ============================================================================
// Command Parameters
// ============================================================================

/// Parameters of `session.status`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusParameters {}

impl CommandParameters for StatusParameters {
    type Result = StatusResult;

    fn method_name(&self) -> &str {
        "session.status"
    }
}

/// Parameters of `session.subscribe`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubscribeParameters {
    /// Event names or module names to subscribe to.
    pub events: Vec<String>,

    /// Browsing contexts to limit the subscription to. Empty means global.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<String>,
}

impl CommandParameters for SubscribeParameters {
    type Result = SubscribeResult;

    fn method_name(&self) -> &str {
        "session.subscribe"
    }
}

/// Parameters of `session.unsubscribe`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnsubscribeParameters {
    /// Event names or module names to unsubscribe from.
    pub events: Vec<String>,
}

impl CommandParameters for UnsubscribeParameters {
    type Result = EmptyResult;

    fn method_name(&self) -> &str {
        "session.unsubscribe"
    }
}

/// Parameters of `session.end`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EndParameters {}

impl CommandParameters for EndParameters {
    type Result = EmptyResult;

    fn method_name(&self) -> &str {
        "session.end"
    }
}

// ============================================================================
// Command Results
// ============================================================================

/// Result of `session.status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResult {
    /// Whether the remote end can create new sessions.
    pub ready: bool,

    /// Implementation-defined status text.
    pub message: String,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub additional_data: AdditionalData,
}

/// Result of `session.subscribe`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubscribeResult {
    /// Subscription identifier, when the remote end issues one.
    #[serde(default)]
    pub subscription: Option<String>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub additional_data: AdditionalData,
}

// ============================================================================
// SessionModule
// ============================================================================

/// Commands of the `session` domain.
#[derive(Debug, Clone)]
pub struct SessionModule {
    driver: WeakDriver,
}

impl Module for SessionModule {
    fn name(&self) -> &str {
        SESSION_MODULE
    }
}

impl SessionModule {
    /// Creates the module bound to `driver`.
    #[inline]
    #[must_use]
    pub fn new(driver: WeakDriver) -> Self {
        Self { driver }
    }

    /// Queries whether the remote end is ready to create sessions.
    ///
    /// # Errors
    ///
    /// [`crate::Error::DriverReleased`] if the driver is gone, otherwise any
    /// error of [`crate::Driver::execute_command`].
    pub async fn status(&self) -> Result<StatusResult> {
        self.driver
            .upgrade()?
            .execute_command(&StatusParameters::default())
            .await
    }

    /// Subscribes to `events` globally.
    ///
    /// # Errors
    ///
    /// See [`SessionModule::status`].
    pub async fn subscribe(&self, events: Vec<String>) -> Result<SubscribeResult> {
        self.execute_subscribe(SubscribeParameters {
            events,
            contexts: Vec::new(),
        })
        .await
    }

    /// Subscribes to `events` in the given browsing contexts only.
    ///
    /// # Errors
    ///
    /// See [`SessionModule::status`].
    pub async fn subscribe_in_contexts(
        &self,
        events: Vec<String>,
        contexts: Vec<String>,
    ) -> Result<SubscribeResult> {
        self.execute_subscribe(SubscribeParameters { events, contexts })
            .await
    }

    /// Removes a subscription to `events`.
    ///
    /// # Errors
    ///
    /// See [`SessionModule::status`].
    pub async fn unsubscribe(&self, events: Vec<String>) -> Result<()> {
        self.driver
            .upgrade()?
            .execute_command(&UnsubscribeParameters { events })
            .await?;
        Ok(())
    }

    /// Ends the session on the remote end.
    ///
    /// # Errors
    ///
    /// See [`SessionModule::status`].
    pub async fn end(&self) -> Result<()> {
        self.driver
            .upgrade()?
            .execute_command(&EndParameters::default())
            .await?;
        Ok(())
    }

    async fn execute_subscribe(&self, params: SubscribeParameters) -> Result<SubscribeResult> {
        self.driver.upgrade()?.execute_command(&params).await
    }
}

// ============================================================================
// Tests
// ============================================================================

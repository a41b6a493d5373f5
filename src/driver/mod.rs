//! WebDriver BiDi driver module.
//!
//! This module provides the main entry point for talking to a remote end.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Driver`] | Connection lifecycle, typed commands, module registry |
//! | [`DriverBuilder`] | Fluent configuration builder |
//! | [`Module`] | Trait implemented by protocol modules |
//! | [`WeakDriver`] | Non-owning driver handle held by modules |
//!
//! # Example
//!
//! ```no_run
//! use webdriver_bidi::{Driver, Result};
//!
//! # async fn example() -> Result<()> {
//! let driver = Driver::builder().build()?;
//! driver.start("ws://127.0.0.1:9222/session").await?;
//!
//! let session = driver.session()?;
//! session.subscribe(vec!["log.entryAdded".into()]).await?;
//!
//! driver.stop().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for driver configuration.
pub mod builder;

/// Core driver implementation.
pub mod core;

/// Module trait and weak driver handle.
pub mod module;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::DriverBuilder;
pub use core::Driver;
pub use module::{Module, WeakDriver};

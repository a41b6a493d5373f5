//! Type-safe identifiers.
//!
//! Newtype wrappers keep command identifiers and observer handles from
//! being mixed up with plain integers.
//!
//! | Type | Wire form | Source |
//! |------|-----------|--------|
//! | [`CommandId`] | JSON integer | Per-transport atomic counter |
//! | [`ObserverId`] | (local only) | Per-observable atomic counter |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// CommandId
// ============================================================================

/// Identifier correlating a command with its response.
///
/// Assigned by the transport from a monotonically increasing counter that
/// starts at 1; never reused within a transport's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Wraps a raw identifier.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ObserverId
// ============================================================================

/// Handle returned when registering an observer, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Wraps a raw handle value.
    #[inline]
    #[must_use]
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

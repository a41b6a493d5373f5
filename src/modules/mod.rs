//! Protocol modules built on [`crate::Driver::execute_command`].
//!
//! | Module | Domain |
//! |--------|--------|
//! | `session` | Remote end status and event subscriptions |

// ============================================================================
// Submodules
// ============================================================================

/// `session` domain commands.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use session::{
    EndParameters, SESSION_MODULE, SessionModule, StatusParameters, StatusResult,
    SubscribeParameters, SubscribeResult, UnsubscribeParameters,
};

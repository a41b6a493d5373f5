//! Optional-deadline waiting.
//!
//! Every blocking wait in the transport takes an `Option<Duration>`:
//! `Some(limit)` bounds the wait, `None` waits for as long as it takes.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

// ============================================================================
// Functions
// ============================================================================

/// Awaits `future`, giving up after `limit` if one is set.
///
/// Returns `None` if the limit elapsed first.
pub(crate) async fn within<F: Future>(limit: Option<Duration>, future: F) -> Option<F::Output> {
    match limit {
        Some(limit) => timeout(limit, future).await.ok(),
        None => Some(future.await),
    }
}

/// Milliseconds in `limit`, for error reporting. `None` reports as `u64::MAX`.
#[inline]
pub(crate) fn millis(limit: Option<Duration>) -> u64 {
    limit.map_or(u64::MAX, |limit| {
        u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
    })
}

// ============================================================================
// Tests
// ============================================================================

//! Ordered asynchronous dispatch.
//!
//! A [`Dispatcher`] decouples "item arrived" from "item processed": the
//! producer enqueues without blocking, and a single background task hands
//! items to a callback one at a time, in enqueue order.
//!
//! # Lifecycle
//!
//! 1. `Dispatcher::new` - Create with the per-item callback
//! 2. `Dispatcher::start` - Spawn the worker task
//! 3. `Dispatcher::try_dispatch` - Enqueue items from any task
//! 4. `Dispatcher::stop_dispatching` - Drain, close and join the worker
//!
//! A stopped dispatcher can be started again.
//!
//! # Panics in the callback
//!
//! The worker catches a panicking callback, logs it and moves on to the next
//! item. This only holds when the crate is built with `panic = "unwind"`
//! (the dev and test profiles). The release profile sets `panic = "abort"`,
//! where a panicking callback terminates the process.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

// ============================================================================
// Constants
// ============================================================================

/// Maximum items taken from the queue per wake-up.
const DRAIN_BATCH: usize = 64;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked for each dispatched item.
pub type DispatchHandler<T> = Arc<dyn Fn(T) + Send + Sync>;

/// A running worker and the queue feeding it.
struct Worker<T> {
    sender: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

/// Shared dispatcher state.
struct DispatcherInner<T> {
    /// Name used in log output.
    name: &'static str,
    /// Per-item callback.
    handler: DispatchHandler<T>,
    /// Running worker, if started.
    worker: Mutex<Option<Worker<T>>>,
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Single-consumer FIFO queue with a dedicated worker task.
///
/// Items are passed to the handler strictly in enqueue order and never
/// concurrently with each other. Cloning yields another handle to the same
/// queue.
pub struct Dispatcher<T> {
    inner: Arc<DispatcherInner<T>>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.inner.name)
            .field("dispatching", &self.inner.worker.lock().is_some())
            .finish()
    }
}

impl<T: Send + 'static> Dispatcher<T> {
    /// Creates a stopped dispatcher that will feed items to `handler`.
    pub fn new<F>(name: &'static str, handler: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(DispatcherInner {
                name,
                handler: Arc::new(handler),
                worker: Mutex::new(None),
            }),
        }
    }

    /// Spawns the worker task.
    ///
    /// Must be called from within a Tokio runtime. Returns `false` if the
    /// dispatcher is already running.
    pub fn start(&self) -> bool {
        let mut worker = self.inner.worker.lock();
        if worker.is_some() {
            return false;
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::run_worker(
            self.inner.name,
            receiver,
            Arc::clone(&self.inner.handler),
        ));

        *worker = Some(Worker { sender, task });
        debug!(dispatcher = self.inner.name, "Dispatcher started");
        true
    }

    /// Enqueues an item without blocking.
    ///
    /// Returns `false` if the dispatcher is not running, i.e. before
    /// `start` or once `stop_dispatching` has begun.
    pub fn try_dispatch(&self, item: T) -> bool {
        match self.inner.worker.lock().as_ref() {
            Some(worker) => worker.sender.send(item).is_ok(),
            None => false,
        }
    }

    /// Returns `true` while the worker is accepting items.
    #[inline]
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.inner.worker.lock().is_some()
    }

    /// Stops accepting items, lets the worker drain the queue, and waits
    /// for it to exit.
    ///
    /// Calling this on a stopped dispatcher is a no-op.
    pub async fn stop_dispatching(&self) {
        let Some(Worker { sender, task }) = self.inner.worker.lock().take() else {
            return;
        };

        // Closing the queue lets the worker finish once it is empty.
        drop(sender);

        if let Err(e) = task.await {
            warn!(dispatcher = self.inner.name, error = %e, "Dispatcher worker failed");
        }

        debug!(dispatcher = self.inner.name, "Dispatcher stopped");
    }

    /// Worker loop: drain whatever is queued, in order, until closed.
    async fn run_worker(
        name: &'static str,
        mut receiver: mpsc::UnboundedReceiver<T>,
        handler: DispatchHandler<T>,
    ) {
        let mut batch = Vec::with_capacity(DRAIN_BATCH);

        while receiver.recv_many(&mut batch, DRAIN_BATCH).await > 0 {
            for item in batch.drain(..) {
                if catch_unwind(AssertUnwindSafe(|| handler(item))).is_err() {
                    error!(dispatcher = name, "Dispatch handler panicked");
                }
            }
        }

        debug!(dispatcher = name, "Dispatcher worker terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn collecting() -> (Dispatcher<u32>, Arc<Mutex<Vec<u32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let dispatcher = Dispatcher::new("test", move |item| seen_clone.lock().push(item));
        (dispatcher, seen)
    }

    #[tokio::test]
    async fn test_items_dispatched_in_order() {
        let (dispatcher, seen) = collecting();
        assert!(dispatcher.start());

        for i in 0..1000 {
            assert!(dispatcher.try_dispatch(i));
        }
        dispatcher.stop_dispatching().await;

        assert_eq!(*seen.lock(), (0..1000).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_slow_item_does_not_reorder() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let dispatcher = Dispatcher::new("slow", move |item: u32| {
            if item == 2 {
                std::thread::sleep(Duration::from_millis(50));
            }
            seen_clone.lock().push(item);
        });
        dispatcher.start();

        for i in 1..=3 {
            dispatcher.try_dispatch(i);
        }
        dispatcher.stop_dispatching().await;

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_rejects_before_start_and_after_stop() {
        let (dispatcher, seen) = collecting();
        assert!(!dispatcher.try_dispatch(1));

        dispatcher.start();
        assert!(dispatcher.try_dispatch(2));
        dispatcher.stop_dispatching().await;
        assert!(!dispatcher.try_dispatch(3));

        assert_eq!(*seen.lock(), vec![2]);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (dispatcher, _) = collecting();
        dispatcher.start();
        dispatcher.stop_dispatching().await;
        dispatcher.stop_dispatching().await;
        assert!(!dispatcher.is_dispatching());
    }

    #[tokio::test]
    async fn test_start_twice_and_restart() {
        let (dispatcher, seen) = collecting();
        assert!(dispatcher.start());
        assert!(!dispatcher.start());
        dispatcher.try_dispatch(1);
        dispatcher.stop_dispatching().await;

        assert!(dispatcher.start());
        dispatcher.try_dispatch(2);
        dispatcher.stop_dispatching().await;

        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_stop_worker() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let dispatcher = Dispatcher::new("panicky", move |item: u32| {
            if item == 1 {
                panic!("boom");
            }
            seen_clone.lock().push(item);
        });
        dispatcher.start();

        dispatcher.try_dispatch(1);
        dispatcher.try_dispatch(2);
        dispatcher.stop_dispatching().await;

        assert_eq!(*seen.lock(), vec![2]);
    }

    #[tokio::test]
    async fn test_clone_shares_queue() {
        let (dispatcher, seen) = collecting();
        let handle = dispatcher.clone();
        dispatcher.start();

        assert!(handle.try_dispatch(9));
        handle.stop_dispatching().await;

        assert!(!dispatcher.is_dispatching());
        assert_eq!(*seen.lock(), vec![9]);
    }
}

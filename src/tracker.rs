//! Completion tracking.
//!
//! Each registered path owns a [`CompletionLatch`] that fires at most once.
//! The shared [`CompletionTracker`] counts outstanding latches and latches its
//! own "all done" signal when the count reaches zero.

use std::future::{self, Future};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Aggregates per-path completion into a single "all done" event
#[derive(Debug)]
pub struct CompletionTracker {
    outstanding: AtomicUsize,
    done: watch::Sender<bool>,
}

impl CompletionTracker {
    /// Tracker expecting `outstanding` latches.
    ///
    /// A tracker created with zero outstanding latches never signals.
    pub fn new(outstanding: usize) -> Arc<Self> {
        let (done, _) = watch::channel(false);
        Arc::new(Self {
            outstanding: AtomicUsize::new(outstanding),
            done,
        })
    }

    /// Hand out a latch bound to this tracker.
    pub fn latch(self: &Arc<Self>) -> CompletionLatch {
        CompletionLatch {
            fired: AtomicBool::new(false),
            tracker: Arc::clone(self),
        }
    }

    /// Record one completion. Returns `true` for the call that finished the set.
    fn fire(&self) -> bool {
        let previous = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => {
                self.done.send_replace(true);
                true
            }
            _ => false,
        }
    }

    /// Latches not yet fired.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    /// Resolves once every latch has fired. Stays pending forever otherwise.
    pub fn all_done(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut done = self.done.subscribe();
        async move {
            if done.wait_for(|done| *done).await.is_err() {
                future::pending::<()>().await;
            }
        }
    }
}

/// Single-fire completion guard for one path
#[derive(Debug)]
pub struct CompletionLatch {
    fired: AtomicBool,
    tracker: Arc<CompletionTracker>,
}

impl CompletionLatch {
    /// Fire the latch. Only the first call has any effect, whatever the
    /// number of concurrent callers; it returns `true`.
    pub fn fire(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.tracker.fire();
        true
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

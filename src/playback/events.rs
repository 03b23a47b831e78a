//! Observer registration for progress and stop notifications.
//!
//! Handlers run on the thread that raises the event: the progress worker for
//! `elapsed` and natural end of stream, the caller of `stop()` otherwise.
//! Invocation order between handlers is unspecified.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::time::Time;
use crate::playback::state::PlaybackState;

/// Handle returned by a registration, used to unsubscribe
pub type SubscriptionId = u64;

/// Periodic progress snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Read cursor in bytes
    pub position: u64,
    pub current_time: Time,
    pub total_duration: Time,
    pub state: PlaybackState,
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was called
    UserRequested,
    /// The sink drained the whole stream
    Finished,
    /// The sink reported an error
    Failed(String),
}

type ElapsedHandler = Arc<dyn Fn(&Progress) + Send + Sync>;
type StoppedHandler = Arc<dyn Fn(&StopReason) + Send + Sync>;

/// Registration lists for the two notification channels
#[derive(Default)]
pub struct Observers {
    next_id: AtomicU64,
    elapsed: Mutex<Vec<(SubscriptionId, ElapsedHandler)>>,
    stopped: Mutex<Vec<(SubscriptionId, StoppedHandler)>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_elapsed<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.elapsed.lock().push((id, Arc::new(handler)));
        id
    }

    pub fn on_stopped<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&StopReason) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.stopped.lock().push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler from whichever list holds it
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut elapsed = self.elapsed.lock();
        let before = elapsed.len();
        elapsed.retain(|(sid, _)| *sid != id);
        if elapsed.len() != before {
            return true;
        }
        drop(elapsed);

        let mut stopped = self.stopped.lock();
        let before = stopped.len();
        stopped.retain(|(sid, _)| *sid != id);
        stopped.len() != before
    }

    // Handlers are cloned out first so they may (un)subscribe while running.
    pub(crate) fn emit_elapsed(&self, progress: &Progress) {
        let handlers: Vec<ElapsedHandler> = self.elapsed.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
        for handler in handlers {
            handler(progress);
        }
    }

    pub(crate) fn emit_stopped(&self, reason: &StopReason) {
        let handlers: Vec<StoppedHandler> = self.stopped.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
        for handler in handlers {
            handler(reason);
        }
    }

    fn next_id(&self) -> SubscriptionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

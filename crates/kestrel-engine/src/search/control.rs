//! Search control: stop flag, node budget and the two time limits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Decides when a search has to end.
///
/// The search polls [`should_stop`](Self::should_stop) every 1024 nodes and
/// [`should_stop_iterating`](Self::should_stop_iterating) between iterations.
///
/// - **Infinite**: only the external stop flag (and a node limit) ends it.
/// - **Timed**: the clock runs from construction.
/// - **Ponder**: limits are known but the clock waits for
///   [`activate`](Self::activate), sent on `ponderhit`.
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    clock_active: AtomicBool,
    start: Mutex<Option<Instant>>,
    soft_limit: Option<Duration>,
    hard_limit: Option<Duration>,
    node_limit: Option<u64>,
}

impl SearchControl {
    pub fn infinite(stopped: Arc<AtomicBool>) -> SearchControl {
        SearchControl {
            stopped,
            clock_active: AtomicBool::new(false),
            start: Mutex::new(None),
            soft_limit: None,
            hard_limit: None,
            node_limit: None,
        }
    }

    /// Clock starts now. Past `soft` no new iteration begins; at `hard` the
    /// running iteration is abandoned.
    pub fn timed(stopped: Arc<AtomicBool>, soft: Duration, hard: Duration) -> SearchControl {
        SearchControl {
            stopped,
            clock_active: AtomicBool::new(true),
            start: Mutex::new(Some(Instant::now())),
            soft_limit: Some(soft),
            hard_limit: Some(hard),
            node_limit: None,
        }
    }

    pub fn ponder(stopped: Arc<AtomicBool>, soft: Duration, hard: Duration) -> SearchControl {
        SearchControl {
            stopped,
            clock_active: AtomicBool::new(false),
            start: Mutex::new(None),
            soft_limit: Some(soft),
            hard_limit: Some(hard),
            node_limit: None,
        }
    }

    /// Also stop once `nodes` nodes have been searched.
    pub fn with_node_limit(mut self, nodes: u64) -> SearchControl {
        self.node_limit = Some(nodes);
        self
    }

    /// Start the clock. A no-op for controls built without time limits.
    pub fn activate(&self) {
        *self.start.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        self.clock_active.store(true, Ordering::Release);
    }

    /// `true` if the search must unwind now.
    ///
    /// Exceeding the hard limit or the node budget raises the shared stop
    /// flag, so later calls answer without reading the clock.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }

        let over_budget = self.node_limit.is_some_and(|limit| nodes >= limit);
        let over_time = self.clock_active.load(Ordering::Acquire)
            && self.hard_limit.is_some_and(|hard| self.elapsed() >= hard);

        if over_budget || over_time {
            self.stopped.store(true, Ordering::Release);
            return true;
        }
        false
    }

    /// `true` if another iteration should not be started.
    pub fn should_stop_iterating(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        self.clock_active.load(Ordering::Acquire)
            && self.soft_limit.is_some_and(|soft| self.elapsed() >= soft)
    }

    /// Time since the clock started, zero while it is inactive.
    pub fn elapsed(&self) -> Duration {
        self.start
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or(Duration::ZERO, |start| start.elapsed())
    }

    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stopped
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for SearchControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchControl")
            .field("stopped", &self.is_stopped())
            .field("clock_active", &self.clock_active.load(Ordering::Relaxed))
            .field("soft_limit", &self.soft_limit)
            .field("hard_limit", &self.hard_limit)
            .field("node_limit", &self.node_limit)
            .finish()
    }
}

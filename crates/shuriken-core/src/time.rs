use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Milliseconds on a participant's monotonic clock.
pub type Millis = u64;

/// Source of monotonic millisecond timestamps.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Millis;
}

/// Wall clock measured from the moment it was created.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Clock that only moves when told to. Clones share the same time source,
/// so a test can hand one copy to the game and advance another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn advance(&self, delta: Millis) {
        self.now.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// A single-shot, polled deadline. There is no callback: owners compare it
/// against the clock every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline(Option<Millis>);

impl Deadline {
    pub const NONE: Deadline = Deadline(None);

    pub fn at(when: Millis) -> Self {
        Self(Some(when))
    }

    pub fn schedule(&mut self, now: Millis, delay: Millis) {
        self.0 = Some(now.saturating_add(delay));
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn when(&self) -> Option<Millis> {
        self.0
    }

    /// True once `now` has reached the scheduled time. An unset deadline never elapses.
    pub fn is_elapsed(&self, now: Millis) -> bool {
        self.0.is_some_and(|t| now >= t)
    }

    pub fn remaining(&self, now: Millis) -> Option<Millis> {
        self.0.map(|t| t.saturating_sub(now))
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Milliseconds since an arbitrary, fixed epoch.
pub type Timestamp = u64;

/// Monotonic millisecond time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-independent clock measuring from its own creation.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_millis() as Timestamp
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.millis.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, delta: u64) -> Timestamp {
        self.millis.fetch_add(delta, Ordering::SeqCst) + delta
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Elapsed time between two readings, zero if the clock was observed out of order.
pub fn elapsed_since(earlier: Timestamp, now: Timestamp) -> u64 {
    now.saturating_sub(earlier)
}

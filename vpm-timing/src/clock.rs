use std::cell::Cell;
use std::rc::Rc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Time source for trial presentation.
///
/// `now` drives deadlines and debounce and must never go backwards;
/// `wall_ms` stamps submitted records and is what the backend subtracts to
/// compute reaction times, so both stamps of a trial must come from the same
/// clock.
pub trait Clock {
    /// Monotonic milliseconds since an arbitrary origin.
    fn now(&self) -> u64;

    /// Wall-clock milliseconds since the Unix epoch.
    fn wall_ms(&self) -> i64;
}

/// Production clock: `Instant` for deadlines, `SystemTime` for record stamps.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn wall_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Epoch base reported by `ManualClock::wall_ms`, so test records carry
/// plausible wall-clock stamps.
const MANUAL_EPOCH_MS: i64 = 1_700_000_000_000;

/// Hand-advanced clock for tests. Clones share the same instant, so a test
/// can keep a handle while the code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.elapsed.set(self.elapsed.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.elapsed.get()
    }

    fn wall_ms(&self) -> i64 {
        MANUAL_EPOCH_MS + self.elapsed.get() as i64
    }
}

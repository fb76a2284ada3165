//! Write timestamp generation.
//!
//! The backend resolves colliding writes (multiple writes with identical
//! timestamps) by lexical comparison on the value bytes. A store that
//! issues two mutations on the same key-column coordinate within one
//! millisecond cannot rely on that tiebreak, so every store owns a
//! [`TimestampOracle`] whose returned values strictly increase. The oracle
//! tracks the wall clock while it advances and refuses to regress with it.
//!
//! The oracle coordinates only calls on its owning store instance. Other
//! store instances, let alone other clients on remote hosts, can still
//! issue colliding writes; handling those is out of scope here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Clock regressions beyond this many milliseconds are logged.
const REGRESSION_WARN_MS: u64 = 50;

/// Upper bound (exclusive) of the random backoff after a lost CAS race.
const CAS_BACKOFF_MAX_MS: u64 = 10;

/// Strictly monotonic millisecond timestamp source.
///
/// Each value returned by [`next_timestamp`](Self::next_timestamp) is
/// greater than every value previously returned by the same oracle, and
/// values are issued at a rate no faster than one per millisecond so they
/// stay aligned with actual epoch milliseconds. Thread safety comes from a
/// compare-and-set on a single atomic; a lost race backs off for a random
/// few milliseconds and retries.
#[derive(Debug)]
pub struct TimestampOracle {
    last_timestamp: AtomicU64,
}

impl TimestampOracle {
    /// Create an oracle primed with the current wall clock.
    pub fn new() -> Self {
        Self {
            last_timestamp: AtomicU64::new(now_millis()),
        }
    }

    /// Create an oracle primed with an explicit last-issued value.
    ///
    /// Priming the oracle ahead of the wall clock reproduces a clock
    /// regression: the next caller sleeps until real time passes the
    /// primed value.
    pub fn starting_at(last_ms: u64) -> Self {
        Self {
            last_timestamp: AtomicU64::new(last_ms),
        }
    }

    /// The most recently issued timestamp.
    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp.load(Ordering::Acquire)
    }

    /// Issue the next timestamp.
    ///
    /// Waits out the current millisecond (and any wall-clock regression)
    /// until the clock reads strictly later than the last issued value,
    /// then publishes the new value with a compare-and-set.
    pub fn next_timestamp(&self) -> u64 {
        let mut first_try = true;

        loop {
            // Random backoff after colliding with another caller.
            if !first_try {
                let backoff = rand::thread_rng().gen_range(0..CAS_BACKOFF_MAX_MS);
                std::thread::sleep(Duration::from_millis(backoff));
            }
            first_try = false;

            let last = self.last_timestamp.load(Ordering::Acquire);

            // Sleep until the wall clock is strictly past `last`. The loop
            // condition, not the sleep duration, guards against early
            // wakeups.
            let mut now = now_millis();
            while now <= last {
                let delta = last - now;
                if delta > REGRESSION_WARN_MS {
                    tracing::warn!(
                        delta_ms = delta,
                        wall_clock_ms = now,
                        last_issued_ms = last,
                        "last issued write timestamp exceeds the current time; \
                         sleeping until the clock catches up"
                    );
                }
                std::thread::sleep(Duration::from_millis(delta + 1));
                now = now_millis();
            }

            if self
                .last_timestamp
                .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return now;
            }
        }
    }
}

impl Default for TimestampOracle {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall clock in milliseconds since the epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

//! Time source abstraction for token issuance and validation.
//!
//! Token operations take the current instant as an explicit argument. This
//! module supplies that instant: the real system clock in production and a
//! controllable clock in tests.
//!
//! All timestamps are whole seconds since the Unix epoch, matching the
//! precision of the `iat`, `nbf` and `exp` fields in a token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Abstraction over the current time.
pub trait TimeSource: Send + Sync {
    /// Get the current time in whole seconds since the Unix epoch.
    fn now_secs(&self) -> Timestamp;
}

/// Real time source using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> Timestamp {
        // A clock set before 1970 reads as the epoch; every token then looks
        // not-yet-valid rather than panicking the request path.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs())
    }
}

/// A controllable time source for deterministic tests.
///
/// Time only moves when [`advance`](Self::advance) or [`set`](Self::set) is
/// called. Backed by an atomic so a single instance can be shared across
/// threads.
#[derive(Debug)]
pub struct SimulatedTimeSource {
    current_secs: AtomicU64,
}

impl SimulatedTimeSource {
    /// Create a simulated time source starting at `initial_secs`.
    #[must_use]
    pub const fn new(initial_secs: Timestamp) -> Self {
        Self {
            current_secs: AtomicU64::new(initial_secs),
        }
    }

    /// Create a simulated time source at `1_700_000_000` (November 2023).
    #[must_use]
    pub const fn default_start() -> Self {
        Self::new(1_700_000_000)
    }

    /// Advance time by `secs`, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) {
        // The closure never returns `None`, so the update always succeeds.
        let _ = self
            .current_secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(secs))
            });
    }

    /// Set the current time to an absolute value.
    pub fn set(&self, secs: Timestamp) {
        self.current_secs.store(secs, Ordering::SeqCst);
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now_secs(&self) -> Timestamp {
        self.current_secs.load(Ordering::SeqCst)
    }
}

//! Time seam for the retry executor.
//!
//! The executor touches time in exactly two ways: it sleeps between attempts
//! and it reads the current instant for diagnostics. Both go through [`Clock`]
//! so tests can substitute a deterministic double and assert on the exact
//! sleep sequence without waiting for real time to pass.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of time for the retry executor.
#[async_trait]
pub trait Clock: Send + Sync {
    /// The current instant. Used for diagnostics only; budget accounting sums
    /// completed sleeps instead, so attempt execution time is never measured.
    fn now(&self) -> Instant;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic clock for tests.
///
/// Sleeps return immediately, advance a virtual timeline, and are recorded in
/// order so tests can assert on the exact backoff schedule:
///
/// ```rust
/// use steadfast::retry::{Clock, RecordingClock};
/// use std::time::Duration;
///
/// # async fn example() {
/// let clock = RecordingClock::new();
/// clock.sleep(Duration::from_secs(2)).await;
/// clock.sleep(Duration::from_secs(4)).await;
/// assert_eq!(
///     clock.sleeps(),
///     vec![Duration::from_secs(2), Duration::from_secs(4)]
/// );
/// assert_eq!(clock.total_slept(), Duration::from_secs(6));
/// # }
/// ```
#[derive(Debug)]
pub struct RecordingClock {
    origin: Instant,
    advanced: Mutex<Duration>,
    slept: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    /// Create a clock whose virtual timeline starts now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            advanced: Mutex::new(Duration::ZERO),
            slept: Mutex::new(Vec::new()),
        }
    }

    /// The recorded sleep durations, in the order they were requested.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().expect("clock lock poisoned").clone()
    }

    /// Total virtual time spent sleeping.
    pub fn total_slept(&self) -> Duration {
        *self.advanced.lock().expect("clock lock poisoned")
    }
}

impl Default for RecordingClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    fn now(&self) -> Instant {
        self.origin + *self.advanced.lock().expect("clock lock poisoned")
    }

    async fn sleep(&self, duration: Duration) {
        *self.advanced.lock().expect("clock lock poisoned") += duration;
        self.slept.lock().expect("clock lock poisoned").push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_clock_tracks_sleeps_and_virtual_time() {
        let clock = RecordingClock::new();
        let before = clock.now();

        clock.sleep(Duration::from_millis(250)).await;
        clock.sleep(Duration::from_millis(750)).await;

        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(250), Duration::from_millis(750)]
        );
        assert_eq!(clock.total_slept(), Duration::from_secs(1));
        assert_eq!(clock.now().duration_since(before), Duration::from_secs(1));
    }

    #[test]
    fn tokio_clock_zero_sleep_completes() {
        tokio_test::block_on(async {
            let clock = TokioClock;
            let before = clock.now();
            clock.sleep(Duration::ZERO).await;
            assert!(clock.now() >= before);
        });
    }
}

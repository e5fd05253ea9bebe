//! The bounded retry loop.

use super::clock::{Clock, TokioClock};
use super::policy::RetryPolicy;
use crate::retry::Classify;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-call transient loop state.
///
/// `slept` advances only through completed sleeps; the time an attempt itself
/// takes is never measured. Each call to `execute` owns its own state on its
/// own stack frame, so concurrent invocations of the same policy never share
/// anything mutable.
#[derive(Debug, Clone, Copy)]
struct ExecutionState {
    slept: Duration,
    next_delay: Duration,
    attempts: u32,
}

impl ExecutionState {
    fn new(initial_delay: Duration) -> Self {
        Self {
            slept: Duration::ZERO,
            next_delay: initial_delay,
            attempts: 0,
        }
    }

    fn record_sleep(&mut self, slept: Duration, multiplier: f64, max_delay: Duration) {
        self.slept += slept;
        self.next_delay = self.next_delay.mul_f64(multiplier).min(max_delay);
    }
}

impl<E> RetryPolicy<E>
where
    E: Classify + std::error::Error,
{
    /// Execute `operation` under this policy against the real clock.
    ///
    /// The operation is re-invoked until it succeeds, its failure class is
    /// ruled out, the filter vetoes, or the cumulative sleep time reaches the
    /// budget. The returned error is always the operation's own most recent
    /// failure, identity preserved.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use steadfast::retry::RetryPolicy;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), std::io::Error> {
    /// let policy = RetryPolicy::builder()
    ///     .budget(Duration::from_secs(10))
    ///     .initial_delay(Duration::from_millis(100))
    ///     .build();
    ///
    /// let attempts = AtomicU32::new(0);
    /// let value = policy
    ///     .execute(|| {
    ///         let attempt = attempts.fetch_add(1, Ordering::SeqCst);
    ///         async move {
    ///             if attempt < 2 {
    ///                 Err(std::io::Error::other("transient"))
    ///             } else {
    ///                 Ok(42)
    ///             }
    ///         }
    ///     })
    ///     .await?;
    /// assert_eq!(value, 42);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_clock(&TokioClock, operation).await
    }

    /// Execute `operation` under this policy against a substituted [`Clock`].
    ///
    /// Identical semantics to [`execute`](RetryPolicy::execute); the seam
    /// exists so tests can drive the loop deterministically and assert on the
    /// exact sleep sequence.
    pub async fn execute_with_clock<T, F, Fut>(
        &self,
        clock: &dyn Clock,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Zero budget is a pure pass-through: one attempt, no sleeps.
        if self.budget.is_zero() {
            return operation().await;
        }

        let started = clock.now();
        let mut state = ExecutionState::new(self.initial_delay);

        loop {
            match operation().await {
                Ok(value) => {
                    if state.attempts > 0 {
                        debug!(
                            attempts = state.attempts + 1,
                            slept = ?state.slept,
                            "operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    state.attempts += 1;

                    // Class and filter rule-outs take precedence over the
                    // budget: an ineligible failure is never retried even
                    // with unlimited budget remaining.
                    if !self.wants_retry(&err) {
                        debug!(
                            error = %err,
                            attempt = state.attempts,
                            "failure class not retryable, propagating"
                        );
                        return Err(err);
                    }

                    if let Some(filter) = &self.filter {
                        if !filter(&err, state.attempts, state.slept) {
                            debug!(
                                error = %err,
                                attempt = state.attempts,
                                "retry vetoed by filter, propagating"
                            );
                            return Err(err);
                        }
                    }

                    // Checked after the failing attempt, so the attempt that
                    // first finds the budget spent still ran. The delay about
                    // to be slept is not counted until it completes.
                    if state.slept >= self.budget {
                        warn!(
                            error = %err,
                            attempts = state.attempts,
                            slept = ?state.slept,
                            wall = ?clock.now().duration_since(started),
                            "retry budget exhausted, giving up"
                        );
                        return Err(err);
                    }

                    let delay = self.jittered(state.next_delay);
                    debug!(
                        error = %err,
                        attempt = state.attempts,
                        delay = ?delay,
                        "attempt failed, retrying after delay"
                    );
                    clock.sleep(delay).await;
                    state.record_sleep(delay, self.multiplier, self.max_delay);
                }
            }
        }
    }
}

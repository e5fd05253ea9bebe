//! Retry policy, builder, and the serde-facing config mirror.

use super::class::Classify;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predicate consulted after a failure's class has been found eligible.
///
/// Receives the failure, the number of attempts made so far (1-based), and
/// the cumulative time spent sleeping. Returning `false` propagates the
/// failure immediately, regardless of remaining budget.
pub type RetryFilter<E> = Arc<dyn Fn(&E, u32, Duration) -> bool + Send + Sync>;

/// Immutable retry policy for a wrapped operation.
///
/// The policy bounds retries by *time*, not by attempt count: the operation
/// is re-invoked until the cumulative delay slept between attempts reaches
/// `budget`. Delays start at `initial_delay` and grow geometrically up to
/// `max_delay`. A budget of [`Duration::ZERO`] disables retries entirely, so
/// the operation runs exactly once.
///
/// Which failures are worth retrying is controlled two ways, checked in this
/// order and both ahead of any budget consideration:
///
/// 1. `retry_on`: a set of failure classes (see [`Classify`]); a failure
///    outside the set is never retried. Unset means every class is eligible.
/// 2. `retry_if`: an optional predicate over the failure, the attempt count,
///    and the elapsed sleep time; a veto propagates immediately.
///
/// # Examples
///
/// ```rust
/// use steadfast::retry::RetryPolicy;
/// use std::io;
/// use std::time::Duration;
///
/// let policy: RetryPolicy<io::Error> = RetryPolicy::builder()
///     .budget(Duration::from_secs(30))
///     .initial_delay(Duration::from_secs(2))
///     .max_delay(Duration::from_secs(10))
///     .retry_on([io::ErrorKind::TimedOut, io::ErrorKind::ConnectionReset])
///     .build();
/// ```
pub struct RetryPolicy<E: Classify> {
    pub(crate) budget: Duration,
    pub(crate) initial_delay: Duration,
    pub(crate) max_delay: Duration,
    pub(crate) multiplier: f64,
    pub(crate) jitter: f64,
    pub(crate) retry_on: Option<Vec<E::Class>>,
    pub(crate) filter: Option<RetryFilter<E>>,
}

impl<E: Classify> RetryPolicy<E> {
    /// Create a new builder for configuring a retry policy.
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::default()
    }

    /// Total sleep budget across all attempts.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Delay before the second attempt.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound on any single delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Whether `err` is eligible for retry under the configured class set.
    pub(crate) fn wants_retry(&self, err: &E) -> bool {
        match &self.retry_on {
            None => true,
            Some(classes) => classes.iter().any(|class| err.is_within(*class)),
        }
    }

    /// Perturb `base` by the configured jitter factor. The geometric
    /// progression itself always advances from the unperturbed base.
    pub(crate) fn jittered(&self, base: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return base;
        }
        let spread = base.as_secs_f64() * self.jitter * (rand::random::<f64>() - 0.5) * 2.0;
        Duration::from_secs_f64((base.as_secs_f64() + spread).max(0.0))
    }
}

impl<E: Classify> Default for RetryPolicy<E> {
    /// A policy with sensible operational defaults.
    ///
    /// Defaults:
    /// - `budget`: 30s
    /// - `initial_delay`: 500ms
    /// - `max_delay`: 10s
    /// - `multiplier`: 2.0 (doubles each time)
    /// - `jitter`: 0.0 (deterministic schedule)
    /// - every failure class eligible, no filter
    fn default() -> Self {
        RetryPolicyBuilder::default().build()
    }
}

impl<E: Classify> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            budget: self.budget,
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            multiplier: self.multiplier,
            jitter: self.jitter,
            retry_on: self.retry_on.clone(),
            filter: self.filter.clone(),
        }
    }
}

impl<E: Classify> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("budget", &self.budget)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("multiplier", &self.multiplier)
            .field("jitter", &self.jitter)
            .field("retry_on", &self.retry_on)
            .field("filter", &self.filter.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

/// Builder for configuring a [`RetryPolicy`].
///
/// # Examples
///
/// ```rust
/// use steadfast::retry::RetryPolicy;
/// use std::io;
/// use std::time::Duration;
///
/// let policy: RetryPolicy<io::Error> = RetryPolicy::builder()
///     .budget(Duration::from_secs(60))
///     .initial_delay(Duration::from_millis(250))
///     .max_delay(Duration::from_secs(5))
///     .retry_if(|err: &io::Error, _attempt, _elapsed| err.kind() != io::ErrorKind::PermissionDenied)
///     .build();
/// ```
pub struct RetryPolicyBuilder<E: Classify> {
    budget: Duration,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: f64,
    retry_on: Option<Vec<E::Class>>,
    filter: Option<RetryFilter<E>>,
}

impl<E: Classify> Default for RetryPolicyBuilder<E> {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(30),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.0,
            retry_on: None,
            filter: None,
        }
    }
}

impl<E: Classify> RetryPolicyBuilder<E> {
    /// Set the total sleep budget across all attempts.
    ///
    /// [`Duration::ZERO`] disables retries: the operation runs exactly once
    /// and any failure propagates immediately.
    pub fn budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Set the delay before the second attempt.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the upper bound on any single delay.
    ///
    /// Raised to `initial_delay` at build time if set lower.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the geometric progression ratio applied after each sleep.
    ///
    /// Clamped to at least 1.0 at build time; delays never shrink.
    ///
    /// Default: 2.0
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the jitter factor (0.0 to 1.0).
    ///
    /// A jitter of 0.1 perturbs each sleep by up to ±10%. Jitter affects only
    /// the slept duration; the base progression stays deterministic.
    ///
    /// Default: 0.0
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Restrict retries to failures within the given classes.
    ///
    /// A failure outside the set propagates on first occurrence regardless of
    /// remaining budget. An empty set makes nothing retryable.
    pub fn retry_on<I>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = E::Class>,
    {
        self.retry_on = Some(classes.into_iter().collect());
        self
    }

    /// Install a retry filter, consulted only for class-eligible failures.
    ///
    /// The filter receives the failure, the attempt count so far (1-based),
    /// and the cumulative sleep time; returning `false` propagates the
    /// failure immediately.
    pub fn retry_if<F>(mut self, filter: F) -> Self
    where
        F: Fn(&E, u32, Duration) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Build the [`RetryPolicy`].
    pub fn build(self) -> RetryPolicy<E> {
        RetryPolicy {
            budget: self.budget,
            initial_delay: self.initial_delay,
            max_delay: self.max_delay.max(self.initial_delay),
            multiplier: self.multiplier.max(1.0),
            jitter: self.jitter,
            retry_on: self.retry_on,
            filter: self.filter,
        }
    }
}

/// Serde-facing mirror of the numeric policy knobs.
///
/// Host tooling embeds this in its own configuration files and converts it
/// into a typed policy at the call site; the class set and filter are code
/// concerns and are layered on afterwards via the builder.
///
/// # Examples
///
/// ```rust
/// use steadfast::retry::{RetryConfig, RetryPolicy};
/// use std::io;
///
/// let config: RetryConfig = serde_json::from_str(
///     r#"{ "budget": { "secs": 30, "nanos": 0 } }"#,
/// ).unwrap();
/// let policy: RetryPolicy<io::Error> = config.to_policy();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total sleep budget across all attempts.
    pub budget: Duration,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Geometric progression ratio.
    pub multiplier: f64,
    /// Randomization factor for jitter.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(30),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.0,
        }
    }
}

impl RetryConfig {
    /// Convert this config into a typed policy with every class eligible.
    pub fn to_policy<E: Classify>(&self) -> RetryPolicy<E> {
        RetryPolicy::builder()
            .budget(self.budget)
            .initial_delay(self.initial_delay)
            .max_delay(self.max_delay)
            .multiplier(self.multiplier)
            .jitter(self.jitter)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io;

    #[test]
    fn builder_defaults() {
        let policy: RetryPolicy<io::Error> = RetryPolicy::builder().build();

        assert_eq!(policy.budget, Duration::from_secs(30));
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
        assert_eq!(policy.multiplier, 2.0);
        assert_eq!(policy.jitter, 0.0);
        assert!(policy.retry_on.is_none());
        assert!(policy.filter.is_none());
    }

    #[test]
    fn builder_custom_values() {
        let policy: RetryPolicy<io::Error> = RetryPolicy::builder()
            .budget(Duration::from_secs(5))
            .initial_delay(Duration::from_millis(200))
            .max_delay(Duration::from_secs(2))
            .multiplier(1.5)
            .jitter(0.2)
            .retry_on([io::ErrorKind::TimedOut])
            .build();

        assert_eq!(policy.budget, Duration::from_secs(5));
        assert_eq!(policy.initial_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(2));
        assert_eq!(policy.multiplier, 1.5);
        assert_eq!(policy.jitter, 0.2);
        assert_eq!(policy.retry_on, Some(vec![io::ErrorKind::TimedOut]));
    }

    #[rstest]
    #[case(Duration::from_millis(100), Duration::from_secs(10), Duration::from_secs(10))]
    #[case(Duration::from_secs(10), Duration::from_secs(1), Duration::from_secs(10))]
    #[case(Duration::from_secs(3), Duration::from_secs(3), Duration::from_secs(3))]
    fn max_delay_never_below_initial_delay(
        #[case] initial: Duration,
        #[case] max: Duration,
        #[case] expected_max: Duration,
    ) {
        let policy: RetryPolicy<io::Error> = RetryPolicy::builder()
            .initial_delay(initial)
            .max_delay(max)
            .build();

        assert_eq!(policy.max_delay, expected_max);
    }

    #[test]
    fn jitter_clamped() {
        let policy: RetryPolicy<io::Error> = RetryPolicy::builder().jitter(2.0).build();
        assert_eq!(policy.jitter, 1.0);

        let policy: RetryPolicy<io::Error> = RetryPolicy::builder().jitter(-0.5).build();
        assert_eq!(policy.jitter, 0.0);
    }

    #[test]
    fn multiplier_never_shrinks_delays() {
        let policy: RetryPolicy<io::Error> = RetryPolicy::builder().multiplier(0.25).build();
        assert_eq!(policy.multiplier, 1.0);
    }

    #[test]
    fn class_eligibility_checks_membership() {
        let policy: RetryPolicy<io::Error> = RetryPolicy::builder()
            .retry_on([io::ErrorKind::TimedOut, io::ErrorKind::ConnectionReset])
            .build();

        assert!(policy.wants_retry(&io::Error::new(io::ErrorKind::TimedOut, "late")));
        assert!(!policy.wants_retry(&io::Error::new(io::ErrorKind::NotFound, "gone")));
    }

    #[test]
    fn empty_class_set_makes_nothing_retryable() {
        let policy: RetryPolicy<io::Error> = RetryPolicy::builder()
            .retry_on(std::iter::empty())
            .build();

        assert!(!policy.wants_retry(&io::Error::new(io::ErrorKind::TimedOut, "late")));
    }

    #[test]
    fn jitter_stays_within_configured_spread() {
        let policy: RetryPolicy<io::Error> = RetryPolicy::builder().jitter(0.5).build();
        let base = Duration::from_secs(1);

        for _ in 0..50 {
            let perturbed = policy.jittered(base);
            assert!(perturbed >= Duration::from_millis(500), "{perturbed:?}");
            assert!(perturbed <= Duration::from_millis(1500), "{perturbed:?}");
        }
    }

    #[test]
    fn config_deserializes_with_partial_fields() {
        let config: RetryConfig =
            serde_json::from_str(r#"{ "multiplier": 3.0 }"#).expect("valid config");

        assert_eq!(config.multiplier, 3.0);
        assert_eq!(config.budget, Duration::from_secs(30));

        let policy: RetryPolicy<io::Error> = config.to_policy();
        assert_eq!(policy.multiplier, 3.0);
        assert!(policy.retry_on.is_none());
    }

    #[test]
    fn debug_elides_the_filter() {
        let policy: RetryPolicy<io::Error> = RetryPolicy::builder()
            .retry_if(|_, _, _| true)
            .build();

        let rendered = format!("{policy:?}");
        assert!(rendered.contains("predicate"));
    }
}

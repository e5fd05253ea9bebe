//! Integration tests for the Steadfast workspace
//!
//! These tests exercise the retry executor and the fail-fast guard together,
//! in the intended composition: retries closest to the risky operation, the
//! guard at the outermost boundary.

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use steadfast::prelude::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum DeployError {
        #[error("upstream not ready")]
        UpstreamNotReady,
        #[error("manifest is malformed")]
        MalformedManifest,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum DeployClass {
        Transient,
        Fatal,
    }

    impl Classify for DeployError {
        type Class = DeployClass;

        fn class(&self) -> DeployClass {
            match self {
                DeployError::UpstreamNotReady => DeployClass::Transient,
                DeployError::MalformedManifest => DeployClass::Fatal,
            }
        }
    }

    #[derive(Debug, Default)]
    struct RecordingTerminator {
        codes: Mutex<Vec<i32>>,
    }

    impl RecordingTerminator {
        fn codes(&self) -> Vec<i32> {
            self.codes.lock().expect("terminator lock poisoned").clone()
        }
    }

    impl Terminator for RecordingTerminator {
        fn terminate(&self, exit_code: i32) {
            self.codes
                .lock()
                .expect("terminator lock poisoned")
                .push(exit_code);
        }
    }

    fn transient_policy() -> RetryPolicy<DeployError> {
        RetryPolicy::builder()
            .budget(Duration::from_secs(30))
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(1))
            .retry_on([DeployClass::Transient])
            .build()
    }

    #[tokio::test]
    async fn transient_failures_are_absorbed_before_the_guard() {
        let terminator = Arc::new(RecordingTerminator::default());
        let guard = FailFast::with_terminator(7, terminator.clone());
        let clock = RecordingClock::new();
        let policy = transient_policy();

        let calls = AtomicU32::new(0);
        let result = guard
            .run(|| {
                policy.execute_with_clock(&clock, || {
                    let attempt = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if attempt < 2 {
                            Err(DeployError::UpstreamNotReady)
                        } else {
                            Ok("deployed")
                        }
                    }
                })
            })
            .await;

        assert_eq!(result.unwrap(), "deployed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(clock.sleeps().len(), 2);
        assert!(terminator.codes().is_empty());
    }

    #[tokio::test]
    async fn fatal_failure_escapes_retries_and_terminates() {
        let terminator = Arc::new(RecordingTerminator::default());
        let guard = FailFast::with_terminator(7, terminator.clone());
        let clock = RecordingClock::new();
        let policy = transient_policy();

        let calls = AtomicU32::new(0);
        let result: Result<(), _> = guard
            .run(|| {
                policy.execute_with_clock(&clock, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(DeployError::MalformedManifest) }
                })
            })
            .await;

        assert!(matches!(result, Err(DeployError::MalformedManifest)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(clock.sleeps().is_empty());
        assert_eq!(terminator.codes(), vec![7]);
    }

    #[tokio::test]
    async fn exhausted_budget_surfaces_the_original_failure_and_terminates() {
        let terminator = Arc::new(RecordingTerminator::default());
        let guard = FailFast::with_terminator(3, terminator.clone());
        let clock = RecordingClock::new();
        let policy: RetryPolicy<DeployError> = RetryPolicy::builder()
            .budget(Duration::from_secs(1))
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(10))
            .build();

        let result: Result<(), _> = guard
            .run(|| {
                policy.execute_with_clock(&clock, || async {
                    Err(DeployError::UpstreamNotReady)
                })
            })
            .await;

        // The budget-exhausted failure keeps its identity through both layers.
        assert!(matches!(result, Err(DeployError::UpstreamNotReady)));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
        assert_eq!(terminator.codes(), vec![3]);
    }

    #[tokio::test]
    async fn wrapping_a_healthy_operation_changes_nothing() {
        let terminator = Arc::new(RecordingTerminator::default());
        let guard = FailFast::with_terminator(7, terminator.clone());
        let clock = RecordingClock::new();
        let policy = transient_policy();

        let calls = AtomicU32::new(0);
        let result = guard
            .run(|| {
                policy.execute_with_clock(&clock, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, DeployError>(vec![1, 2, 3]) }
                })
            })
            .await;

        assert_eq!(result.unwrap(), vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(clock.sleeps().is_empty());
        assert!(terminator.codes().is_empty());
    }

    #[rstest]
    #[case(5)]
    #[case(77)]
    #[tokio::test]
    async fn guard_applies_without_retries_too(#[case] exit_code: i32) {
        let terminator = Arc::new(RecordingTerminator::default());
        let guard = FailFast::with_terminator(exit_code, terminator.clone());

        let result: Result<(), _> = guard
            .run(|| async { Err(DeployError::MalformedManifest) })
            .await;

        assert!(result.is_err());
        assert_eq!(terminator.codes(), vec![exit_code]);
    }
}

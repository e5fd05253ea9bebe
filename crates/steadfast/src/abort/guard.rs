//! The fail-fast guard and its termination seam.

use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;
use tracing::error;

/// Process-termination seam.
///
/// The production implementation does not return; test doubles record the
/// requested exit code and do, which is what makes the guard's re-raise path
/// observable.
pub trait Terminator: Send + Sync {
    /// Request immediate process termination with `exit_code`.
    fn terminate(&self, exit_code: i32);
}

/// Real process termination via [`std::process::exit`].
///
/// Terminates immediately without unwinding the stack: no destructors run and
/// no pending work is flushed. Once an invariant is believed broken, stopping
/// beats continuing in a corrupted state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self, exit_code: i32) {
        std::process::exit(exit_code);
    }
}

/// Guard that turns any escaping failure into immediate process termination.
///
/// On success the wrapped operation's value passes through untouched. On an
/// error return or a panic, the guard logs the cause, requests termination
/// with the configured exit code, and then re-raises the original failure
/// unchanged.
///
/// # Examples
///
/// ```rust
/// use steadfast::abort::FailFast;
///
/// # async fn example() -> Result<(), std::io::Error> {
/// let guard = FailFast::new(1);
/// let report = guard
///     .run(|| async { Ok::<_, std::io::Error>("nightly sync complete") })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct FailFast {
    exit_code: i32,
    terminator: Arc<dyn Terminator>,
}

impl FailFast {
    /// Guard with real process termination.
    pub fn new(exit_code: i32) -> Self {
        Self::with_terminator(exit_code, Arc::new(ProcessExit))
    }

    /// Guard with a substituted termination seam.
    pub fn with_terminator(exit_code: i32, terminator: Arc<dyn Terminator>) -> Self {
        Self {
            exit_code,
            terminator,
        }
    }

    /// The exit status used on any escaping failure.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Invoke `operation`, terminating the process if anything escapes it.
    ///
    /// The returned `Err` (or resumed panic) is unreachable in real
    /// deployment — the process has already exited — but keeps the guard's
    /// logic testable and the cause visible if termination is intercepted.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error,
    {
        match AssertUnwindSafe(operation()).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                error!(
                    error = %err,
                    source = ?err.source(),
                    exit_code = self.exit_code,
                    "unrecoverable failure at process boundary, terminating"
                );
                self.terminator.terminate(self.exit_code);
                Err(err)
            }
            Err(panic) => {
                error!(
                    panic = panic_message(panic.as_ref()),
                    exit_code = self.exit_code,
                    "panic reached process boundary, terminating"
                );
                self.terminator.terminate(self.exit_code);
                resume_unwind(panic)
            }
        }
    }
}

impl Default for FailFast {
    /// Guard exiting with status 1, the conventional generic failure code.
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Debug for FailFast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailFast")
            .field("exit_code", &self.exit_code)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "opaque panic payload"
    }
}

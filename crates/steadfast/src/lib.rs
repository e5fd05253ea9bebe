#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Resilience primitives for operational tooling.
//!
//! This crate provides two small, composable wrappers around arbitrary
//! async operations:
//!
//! - **Bounded retry** via [`retry::RetryPolicy`]: re-invoke a failing
//!   operation under a time-boxed, exponentially-backed-off schedule, with
//!   typed control over which failure classes are eligible for retry.
//! - **Fail-fast abort** via [`abort::FailFast`]: catch anything escaping a
//!   top-level operation, terminate the process immediately with a configured
//!   exit code, and still surface the original failure to the caller.
//!
//! The two components share no state and compose in either order, but the
//! intended arrangement is retries innermost and the guard outermost, so
//! transient failures are absorbed before the guard ever sees them.
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use steadfast::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let policy = RetryPolicy::builder()
//!     .budget(Duration::from_secs(30))
//!     .initial_delay(Duration::from_secs(2))
//!     .max_delay(Duration::from_secs(10))
//!     .build();
//!
//! let guard = FailFast::new(1);
//!
//! let answer = guard
//!     .run(|| policy.execute(|| async { Ok::<_, std::io::Error>(42) }))
//!     .await?;
//! assert_eq!(answer, 42);
//! # Ok(())
//! # }
//! ```

pub mod abort;
pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use steadfast::prelude::*;
/// ```
pub mod prelude {
    pub use crate::abort::{FailFast, ProcessExit, Terminator};
    pub use crate::retry::{
        Classify, Clock, RecordingClock, RetryConfig, RetryFilter, RetryPolicy,
        RetryPolicyBuilder, TokioClock,
    };
}

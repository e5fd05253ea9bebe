//! Fail-fast process abort.
//!
//! [`FailFast`] sits at the outermost boundary of a program's entry point.
//! Anything that escapes the wrapped operation — an error return or a panic —
//! is logged, then the process is terminated immediately with the configured
//! exit code, without unwinding the stack or running destructors. The
//! original failure is still re-raised after the termination request so the
//! guard stays unit-testable and an intercepted termination still surfaces
//! its cause.
//!
//! Catching panics is a deliberate, documented exception to ordinary error
//! propagation, confined to this single boundary. Everywhere else failures
//! travel as `Result` values; here the point is that *nothing* gets past.
//!
//! This guard is indiscriminate by design: no allow-list, no retry
//! interaction. Retries belong inside it, closest to the risky operation, so
//! transient failures are absorbed before the guard ever sees them.
//!
//! # Examples
//!
//! ```rust
//! use steadfast::abort::FailFast;
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let guard = FailFast::new(2);
//!
//! let value = guard
//!     .run(|| async {
//!         // The program's top-level work.
//!         Ok::<_, std::io::Error>("done")
//!     })
//!     .await?;
//! assert_eq!(value, "done");
//! # Ok(())
//! # }
//! ```

mod guard;

pub use guard::{FailFast, ProcessExit, Terminator};

//! Bounded retry with exponential backoff.
//!
//! The executor re-invokes a failing operation until it succeeds, its failure
//! class is ruled out, a configured filter vetoes the retry, or the cumulative
//! time spent sleeping between attempts reaches the policy's budget. Delays
//! grow geometrically from [`RetryPolicy`]'s initial delay up to a cap; the
//! final failure is always the operation's own error, never a wrapper.
//!
//! # Key Types
//!
//! - [`RetryPolicy`] - immutable retry policy plus the execution entry points
//! - [`Classify`] - failure-taxonomy seam for typed retry eligibility
//! - [`Clock`] - time seam ([`TokioClock`] for production, [`RecordingClock`]
//!   for deterministic tests)
//!
//! # Examples
//!
//! ```rust
//! use steadfast::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let policy = RetryPolicy::builder()
//!     .budget(Duration::from_secs(30))
//!     .initial_delay(Duration::from_secs(2))
//!     .max_delay(Duration::from_secs(10))
//!     .build();
//!
//! let value = policy
//!     .execute(|| async {
//!         // Your operation here
//!         Ok::<_, std::io::Error>(42)
//!     })
//!     .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

mod class;
mod clock;
mod executor;
mod policy;

pub use class::Classify;
pub use clock::{Clock, RecordingClock, TokioClock};
pub use policy::{RetryConfig, RetryFilter, RetryPolicy, RetryPolicyBuilder};

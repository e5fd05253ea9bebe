//! Example: fail-fast guard at the program boundary
//!
//! The guard wraps the program's top-level work. A failure escaping it would
//! terminate the process immediately with the configured exit code; here the
//! work succeeds, and a second section shows the composition with retries.
//!
//! Run with:
//! ```bash
//! cargo run -p steadfast --example abort_example
//! ```

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use steadfast::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
enum CollectError {
    #[error("metric endpoint unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CollectClass;

impl Classify for CollectError {
    type Class = CollectClass;

    fn class(&self) -> CollectClass {
        CollectClass
    }
}

/// Simulated metric collection that recovers on the third attempt.
async fn collect_sample(attempts: &AtomicU32) -> Result<u64, CollectError> {
    let attempt = attempts.fetch_add(1, Ordering::SeqCst);
    if attempt < 2 {
        println!("  Attempt {}: endpoint unavailable", attempt + 1);
        Err(CollectError::Unavailable)
    } else {
        println!("  Attempt {}: collected sample", attempt + 1);
        Ok(4821)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("steadfast=debug")
        .init();

    println!("==============================================");
    println!("   Steadfast: Fail-Fast Guard Example");
    println!("==============================================");

    // Retries innermost, guard outermost: transient failures are absorbed
    // before the guard ever sees them.
    let guard = FailFast::new(2);
    let policy = RetryPolicy::builder()
        .budget(Duration::from_secs(10))
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(1))
        .build();

    let attempts = Arc::new(AtomicU32::new(0));
    let sample = guard
        .run(|| policy.execute(|| collect_sample(&attempts)))
        .await?;

    println!("\n  Sample value: {sample}");
    println!("  Process survived: the failure never escaped the retries.");

    println!("\n==============================================");
    println!("   Example completed successfully!");
    println!("==============================================\n");

    Ok(())
}

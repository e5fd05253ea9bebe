//! Example: bounded retry around an unreliable operation
//!
//! This example demonstrates:
//! 1. Simple time-budgeted retry with exponential backoff
//! 2. Restricting retries to specific failure classes
//! 3. A retry filter that gives up early
//!
//! Run with:
//! ```bash
//! cargo run -p steadfast --example retry_example
//! ```

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use steadfast::prelude::*;
use thiserror::Error;

/// A simulated probe endpoint that fails the first few times.
struct UnreliableProbe {
    attempts: Arc<AtomicU32>,
    fail_count: u32,
}

#[derive(Debug, Error)]
enum ProbeError {
    #[error("probe timed out")]
    Timeout,
    #[error("probe rejected: bad credentials")]
    Credentials,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ProbeClass {
    Timeout,
    Credentials,
}

impl Classify for ProbeError {
    type Class = ProbeClass;

    fn class(&self) -> ProbeClass {
        match self {
            ProbeError::Timeout => ProbeClass::Timeout,
            ProbeError::Credentials => ProbeClass::Credentials,
        }
    }
}

impl UnreliableProbe {
    fn new(fail_count: u32) -> Self {
        Self {
            attempts: Arc::new(AtomicU32::new(0)),
            fail_count,
        }
    }

    async fn call(&self) -> Result<String, ProbeError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        if attempt < self.fail_count {
            println!("  Attempt {}: FAILED (timeout)", attempt + 1);
            Err(ProbeError::Timeout)
        } else {
            println!("  Attempt {}: SUCCESS", attempt + 1);
            Ok("probe response".to_string())
        }
    }
}

async fn example_simple_retry() -> Result<(), Box<dyn Error>> {
    println!("\n1. Simple time-budgeted retry");
    println!("   Budget 10s, delays 100ms -> 200ms -> 400ms ...");

    let policy = RetryPolicy::builder()
        .budget(Duration::from_secs(10))
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(1))
        .build();

    let probe = UnreliableProbe::new(2);
    let response = policy.execute(|| probe.call()).await?;
    println!("  Result: {response}");

    Ok(())
}

async fn example_class_restriction() -> Result<(), Box<dyn Error>> {
    println!("\n2. Only timeouts are worth retrying");

    let policy = RetryPolicy::builder()
        .budget(Duration::from_secs(10))
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(1))
        .retry_on([ProbeClass::Timeout])
        .build();

    let outcome: Result<String, ProbeError> = policy
        .execute(|| async {
            println!("  Attempt: FAILED (bad credentials)");
            Err(ProbeError::Credentials)
        })
        .await;

    println!("  Propagated without retry: {}", outcome.unwrap_err());

    Ok(())
}

async fn example_retry_filter() -> Result<(), Box<dyn Error>> {
    println!("\n3. Filter gives up after three attempts");

    let policy = RetryPolicy::builder()
        .budget(Duration::from_secs(600))
        .initial_delay(Duration::from_millis(50))
        .max_delay(Duration::from_millis(50))
        .retry_if(|_err: &ProbeError, attempt, _elapsed| attempt < 3)
        .build();

    let probe = UnreliableProbe::new(u32::MAX);
    let outcome = policy.execute(|| probe.call()).await;

    println!(
        "  Gave up after {} attempts: {}",
        probe.attempts.load(Ordering::SeqCst),
        outcome.unwrap_err()
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("steadfast=debug")
        .init();

    println!("==============================================");
    println!("   Steadfast: Retry Policy Examples");
    println!("==============================================");

    example_simple_retry().await?;
    example_class_restriction().await?;
    example_retry_filter().await?;

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}

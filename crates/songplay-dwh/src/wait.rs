//! Fixed-interval resource polling.
//!
//! Provides a generic abstraction for waiting on an AWS resource (or any async
//! condition) to reach a desired state, checking at a constant interval with an
//! optional overall timeout.

use anyhow::Result;
use backon::{BackoffBuilder, ConstantBuilder};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Configuration for resource polling.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay between checks
    pub interval: Duration,
    /// Maximum total time to wait; `None` polls until the check succeeds
    pub timeout: Option<Duration>,
}

impl WaitConfig {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }
}

/// Returned (inside `anyhow::Error`) when a wait exceeds its timeout
#[derive(Debug, Error)]
#[error("Timeout waiting for {resource} after {elapsed:?} ({attempts} attempts)")]
pub struct WaitTimeout {
    pub resource: String,
    pub elapsed: Duration,
    pub attempts: u32,
}

/// Wait for a resource to reach the desired state.
///
/// # Arguments
/// * `config` - Wait configuration
/// * `check` - Async function that returns `Ok(true)` when done, `Ok(false)` to retry
/// * `resource_name` - Name for logging
///
/// # Returns
/// * `Ok(attempts)` - The check succeeded after this many attempts
/// * `Err` - `WaitTimeout`, or the error the check returned
///
/// # Example
/// ```ignore
/// wait_for_resource(
///     WaitConfig::new(Duration::from_secs(20), None),
///     || async {
///         let ready = check_if_resource_exists().await;
///         Ok(ready)
///     },
///     "my-resource",
/// ).await?;
/// ```
pub async fn wait_for_resource<F, Fut>(
    config: WaitConfig,
    mut check: F,
    resource_name: &str,
) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    let mut delays = ConstantBuilder::default()
        .with_delay(config.interval)
        .without_max_times()
        .build();

    loop {
        attempts += 1;

        match check().await {
            Ok(true) => {
                debug!(resource = %resource_name, attempts, "Resource reached desired state");
                return Ok(attempts);
            }
            Ok(false) => {
                let delay = delays.next().unwrap_or(config.interval);

                if let Some(timeout) = config.timeout {
                    let elapsed = start.elapsed();
                    if elapsed + delay > timeout {
                        warn!(resource = %resource_name, attempts, "Timed out waiting for resource");
                        return Err(WaitTimeout {
                            resource: resource_name.to_string(),
                            elapsed,
                            attempts,
                        }
                        .into());
                    }
                }

                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Resource check failed");
                return Err(e);
            }
        }
    }
}

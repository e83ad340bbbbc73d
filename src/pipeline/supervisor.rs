// src/pipeline/supervisor.rs

//! Bounded restart of long-running tasks.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;
use crate::models::SupervisorConfig;

/// Restart policy: exponential backoff, capped, with a hard limit on
/// consecutive failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Runs lasting at least this long start a fresh attempt count
    pub healthy_after: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SupervisorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_secs(config.initial_backoff_secs),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
            healthy_after: Duration::from_secs(config.healthy_after_secs),
        }
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1 << exponent)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SupervisorConfig::default())
    }
}

/// Run `task` until it succeeds, restarting it after each failure.
///
/// Returns the last error once `max_attempts` consecutive runs have failed.
/// A run that stayed up for `healthy_after` does not count against earlier
/// failures.
pub async fn supervise<F, Fut>(name: &str, policy: &RetryPolicy, mut task: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut attempt = 0;
    loop {
        let started = Instant::now();
        match task().await {
            Ok(()) => {
                log::info!("{} finished", name);
                return Ok(());
            }
            Err(e) => {
                if started.elapsed() >= policy.healthy_after {
                    attempt = 0;
                }
                attempt += 1;
                if attempt >= policy.max_attempts {
                    log::error!("{} failed {} times, giving up: {}", name, attempt, e);
                    return Err(e);
                }
                let delay = policy.backoff_for(attempt);
                log::warn!(
                    "{} failed (attempt {}/{}): {}. Restarting in {:?}",
                    name,
                    attempt,
                    policy.max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

//! Bounded polling of backend jobs (runs, file binds).

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::config::PollPolicyConfig;
use crate::error::{Error, Result};
use crate::models::Pollable;

/// Time source used between status checks.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Limits applied to one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub deadline: Duration,
}

impl From<&PollPolicyConfig> for PollPolicy {
    fn from(config: &PollPolicyConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts.max(1),
            deadline: Duration::from_secs(config.max_wait_secs),
        }
    }
}

/// Repeatedly fetches a job until it reports a terminal status.
#[derive(Clone)]
pub struct Poller {
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
}

impl Poller {
    pub fn new(clock: Arc<dyn Clock>, policy: PollPolicy) -> Self {
        Self { clock, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Call `fetch` until it returns a terminal value.
    ///
    /// Fetch errors end the loop immediately. Running out of attempts or
    /// passing the deadline yields [`Error::PollTimeout`].
    pub async fn until_terminal<T, F, Fut>(&self, what: &str, mut fetch: F) -> Result<T>
    where
        T: Pollable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = self.clock.now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let value = fetch().await?;
            if value.is_terminal() {
                return Ok(value);
            }

            let elapsed = self.clock.now().saturating_duration_since(started);
            if attempts >= self.policy.max_attempts
                || elapsed + self.policy.interval > self.policy.deadline
            {
                return Err(Error::PollTimeout {
                    what: what.to_string(),
                    attempts,
                });
            }

            debug!(what, attempts, "Not terminal yet, polling again");
            self.clock.sleep(self.policy.interval).await;
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;

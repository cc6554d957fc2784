//! Bounded retry with exponential backoff for transient oracle failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::OracleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Fail on the first error. Used by the repair path, where a human is
    /// watching each item.
    pub fn none() -> Self {
        RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        }
    }

    fn backoff(&self, retries: u32) -> Duration {
        let factor = 1u32 << retries.min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op`, retrying transient failures up to `max_retries` times.
    /// Permanent errors surface immediately.
    pub async fn run<T, F, Fut>(&self, call: &str, mut op: F) -> Result<T, OracleError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OracleError>>,
    {
        let mut retries = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    let backoff = self.backoff(retries);

                    warn!(
                        error = %e,
                        call,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_secs = backoff.as_secs(),
                        "retrying oracle call"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

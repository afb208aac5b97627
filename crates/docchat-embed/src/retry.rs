use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff: `min_delay * 2^(attempt-1)`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self { Self { max_attempts: 5, min_delay: Duration::from_secs(1), max_delay: Duration::from_secs(10) } }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self { self.max_attempts = max_attempts.max(1); self }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.min_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    /// `op` reports `Err((err, retryable))`.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, (E, bool)>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err((err, retryable)) => {
                    if !retryable || attempt >= self.max_attempts { return Err(err); }
                    let delay = self.delay(attempt);
                    warn!("{} failed (attempt {}/{}): {}; retrying in {:?}", what, attempt, self.max_attempts, err, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

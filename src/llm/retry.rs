use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::GatewayError;

/// Retry policy applied around every model call, whatever the provider
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single wait
    pub max_delay: Duration,
    /// Growth factor between consecutive waits
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Wait before retry number `retry` (1-based): `base * multiplier^(retry-1)`, capped
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// Run `op` until it succeeds or the policy gives up, returning the last error
///
/// Configuration errors are returned immediately since retrying cannot fix them.
pub async fn retry_with_policy<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() || attempt >= max_attempts => {
                warn!("{} failed after {} attempt(s): {}", label, attempt, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} attempt {} of {} failed: {} (retrying in {:?})",
                    label, attempt, max_attempts, e, delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

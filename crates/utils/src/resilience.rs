//! Retry with exponential backoff for transient failures

use ledgerprep_core::{Error, Result};
use std::future::Future;
use std::time::{Duration, SystemTime};
use tokio::time::sleep;

/// Default maximum number of retry attempts
const DEFAULT_MAX_RETRIES: usize = 3;

/// Default base delay for exponential backoff (100ms)
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Default maximum delay for exponential backoff (10s)
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Default jitter factor (0.1 = 10% randomization)
const DEFAULT_JITTER_FACTOR: f64 = 0.1;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: usize,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Jitter factor for randomization (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl RetryConfig {
    /// Retry config for ledger writes handed to the invoke queue
    pub fn for_ledger(max_retries: usize) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.2,
        }
    }

    /// Only transient errors are retried
    pub fn should_retry(&self, error: &Error) -> bool {
        error.is_transient()
    }

    /// Calculate delay for a given attempt with exponential backoff and jitter
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31) as u32);
        let exponential_delay = self.base_delay.saturating_mul(factor);
        let capped_delay = exponential_delay.min(self.max_delay);

        if self.jitter_factor > 0.0 {
            let jitter_range = capped_delay.as_millis() as f64 * self.jitter_factor;
            // Pseudo-random jitter seeded from the clock
            let seed = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos() as f64;
            let normalized = ((seed % 1000.0) / 1000.0 - 0.5) * 2.0;
            let jitter = normalized * jitter_range;
            let final_millis = (capped_delay.as_millis() as f64 + jitter).max(0.0) as u64;
            Duration::from_millis(final_millis)
        } else {
            capped_delay
        }
    }
}

/// Execute an operation with retry logic
pub async fn retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempt, "Operation succeeded after retries");
                }
                return Ok(result);
            }
            Err(error) if attempt < config.max_retries && config.should_retry(&error) => {
                let delay = config.calculate_delay(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = config.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Operation failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_factor: 0.0,
        }
    }

    #[test]
    fn test_calculate_delay_is_capped() {
        let config = RetryConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            jitter_factor: 0.0,
            ..Default::default()
        };

        assert_eq!(config.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(config.calculate_delay(2), Duration::from_millis(400));
        assert_eq!(config.calculate_delay(10), Duration::from_secs(1));
        assert_eq!(config.calculate_delay(200), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_retries_transient_errors_until_success() {
        let calls = AtomicUsize::new(0);

        let result = retry(&fast(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::transport("http://ledger", "connection refused"))
            } else {
                Ok(201u16)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 201);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = AtomicUsize::new(0);

        let result: Result<()> = retry(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::integrity("algo", "aa", "bb"))
        })
        .await;

        assert!(matches!(result, Err(Error::Integrity { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicUsize::new(0);

        let result: Result<()> = retry(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::transport("http://ledger", "timed out"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}

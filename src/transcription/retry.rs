//! Shared bounded-retry wrapper for vendor API calls
//!
//! Single point of control for outbound vendor requests: every adapter
//! routes its HTTP calls through [`retry_api`] so transient failures are
//! retried uniformly before a provider error surfaces to the caller.

use std::future::Future;
use std::time::Duration;

use crate::transcription::TranscriptionError;

/// Retry behavior for vendor calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,

    /// Delay before the first retry; doubles on each subsequent one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Run a vendor call with the default retry policy.
pub async fn retry_api<T, F, Fut>(provider: &'static str, op: F) -> Result<T, TranscriptionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TranscriptionError>>,
{
    retry_with_policy(provider, RetryPolicy::default(), op).await
}

/// Run a vendor call, retrying with exponential backoff until the policy
/// is exhausted. The last error is surfaced unchanged.
pub async fn retry_with_policy<T, F, Fut>(
    provider: &'static str,
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, TranscriptionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TranscriptionError>>,
{
    let attempts = policy.attempts.max(1);
    let mut delay = policy.base_delay;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    "{} call failed (attempt {}/{}): {}. Retrying in {:?}",
                    provider,
                    attempt,
                    attempts,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("retry loop always returns")
}

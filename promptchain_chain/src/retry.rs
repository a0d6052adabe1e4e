use std::future::Future;
use std::time::Duration;

use promptchain_core::ChainError;
use tokio::time::{sleep, timeout};
use tracing::warn;

/// How a remote call is re-attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub retries: u32,
    /// Per-attempt wall-clock budget.
    pub timeout: Option<Duration>,
    /// Pause before the first retry, doubled for each later one.
    pub backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Run `operation` until it succeeds, attempts run out, or it fails with a
/// non-retryable error.
///
/// Attempts are strictly sequential. A timed-out attempt is abandoned, not
/// cancelled: whatever the dropped future had started on the remote side is
/// left to the transport.
///
/// # Returns
/// The first successful result, or the error of the last attempt.
pub async fn retry_with_timeout<F, Fut, T>(
    mut operation: F,
    policy: &RetryPolicy,
) -> Result<T, ChainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let attempts = policy.attempts();
    let mut delay = policy.backoff;
    let mut attempt = 1;

    loop {
        let outcome = match policy.timeout {
            Some(limit) => timeout(limit, operation())
                .await
                .unwrap_or(Err(ChainError::Timeout(limit))),
            None => operation().await,
        };

        let e = match outcome {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if attempt >= attempts || !e.is_retryable() {
            return Err(e);
        }

        warn!("Request failed (attempt {attempt}/{attempts}): {e}. Retrying...");
        if !delay.is_zero() {
            sleep(delay).await;
            delay = delay.saturating_mul(2);
        }
        attempt += 1;
    }
}

//! Retry wrapper with exponential backoff and jitter
//!
//! Only transient errors (429, timeout, connection reset) are retried;
//! logical errors rethrow immediately so a malformed call cannot burn rate
//! budget on hopeless attempts.
use crate::errors::RpcResult;
use log::warn;
use rand::Rng;
use std::future::Future;
use tokio::time::Duration;

const BACKOFF_BASE_MS: u64 = 1000;

/// Delay before retry number `attempt` (1-based): `2^attempt * 1s` plus up
/// to one second of jitter to decorrelate callers hammering the same
/// provider.
fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE_MS.saturating_mul(1u64 << attempt.min(16));
    let jitter = rand::thread_rng().gen_range(0..BACKOFF_BASE_MS);
    Duration::from_millis(exp + jitter)
}

/// Run `op` up to `max_attempts` times, sleeping between transient failures.
/// The last error is returned once attempts are exhausted.
pub async fn with_retry<T, F, Fut>(max_attempts: u32, mut op: F) -> RpcResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RpcResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(err);
                }
                let delay = backoff_delay(attempt);
                warn!(
                    "transient rpc failure ({}), retry {}/{} in {:?}",
                    err,
                    attempt + 1,
                    max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

use std::future::Future;
use std::time::Duration;

use valet_core::UpstreamError;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const BACKOFF_BASE_MS: u64 = 200;

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client, UpstreamError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .map_err(|err| UpstreamError::Transport(err.to_string()))
}

pub(crate) fn transport(err: reqwest::Error) -> UpstreamError {
    UpstreamError::Transport(err.to_string())
}

/// Only transport-level failures (including timeouts) are worth retrying.
/// Unexpected statuses and decode failures would return the same result.
fn is_retriable(err: &UpstreamError) -> bool {
    matches!(err, UpstreamError::Transport(_))
}

/// Runs `operation` with capped exponential backoff on transient errors:
/// `BACKOFF_BASE_MS * 2^attempt` between attempts, `max_retries` additional
/// attempts after the first.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    mut operation: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay_ms = BACKOFF_BASE_MS.saturating_mul(1u64 << attempt.min(16));
                tracing::warn!(
                    attempt,
                    delay_ms,
                    error = %err,
                    "transient upstream failure, backing off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use valet_core::UpstreamError;

    use super::retry_with_backoff;

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(3, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(UpstreamError::Transport("connection reset".to_owned()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retriable_errors_return_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(3, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(UpstreamError::UnexpectedStatus { status: 403, url: "http://x".to_owned() })
        })
        .await;

        assert!(matches!(result, Err(UpstreamError::UnexpectedStatus { status: 403, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_are_exhausted_with_the_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(1, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(UpstreamError::Transport("timed out".to_owned()))
        })
        .await;

        assert!(matches!(result, Err(UpstreamError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use tokio::time;
use tokio_retry::strategy::ExponentialBackoff;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// Bounded exponential-backoff wrapper around a single outbound request.
///
/// Transient failures (transport errors, 429, 5xx) are retried with 1s,
/// 2s, 4s... waits between attempts. Anything else returns immediately.
/// Once attempts are exhausted the last response is surfaced as-is, even
/// when its status is retryable; the last transport error is rethrown.
/// Holds no shared state, so unrelated requests may retry concurrently.
pub struct RetryClient {
    max_attempts: usize,
}

impl Default for RetryClient {
    fn default() -> RetryClient {
        let max_attempts = Config::get(ConfigKey::RequestMaxAttempts)
            .parse::<usize>()
            .unwrap_or(3);

        return RetryClient::new(max_attempts);
    }
}

impl RetryClient {
    pub fn new(max_attempts: usize) -> RetryClient {
        return RetryClient {
            max_attempts: max_attempts.max(1),
        };
    }

    fn is_retryable(status: StatusCode) -> bool {
        return status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let mut delays = ExponentialBackoff::from_millis(2).factor(500);
        let mut attempt = 0;

        loop {
            let req = match request.try_clone() {
                Some(req) => req,
                None => bail!("Request body cannot be cloned for retry"),
            };
            let last = attempt + 1 >= self.max_attempts;

            match req.send().await {
                Ok(res) => {
                    if last || !RetryClient::is_retryable(res.status()) {
                        return Ok(res);
                    }
                    tracing::warn!(
                        status = res.status().as_u16(),
                        attempt = attempt,
                        "retrying transient response"
                    );
                }
                Err(err) => {
                    if last {
                        return Err(err.into());
                    }
                    tracing::warn!(err = ?err, attempt = attempt, "retrying transport error");
                }
            }

            if let Some(delay) = delays.next() {
                time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

//! HTTP client wrapper for downloading from the radiko API.

use std::time::Duration;

use reqwest::Client;

use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("radiko-harvester/", env!("CARGO_PKG_VERSION"));

/// How often a failed upstream request is attempted.
///
/// The default is a single attempt: any failure is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Must be at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for every further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff with the given number of attempts.
    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before the given (zero-based) attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.base_delay
            .saturating_mul(1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX))
    }
}

/// Create a configured HTTP client.
pub fn create_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|source| HarvesterError::Transport {
            url: String::new(),
            source,
        })
}

/// Download a response body as text, following the retry policy.
///
/// Connection errors, timeouts and 5xx responses are retried while attempts
/// remain. Any other failure, including 4xx, is returned immediately.
pub async fn download_text(client: &Client, url: &str, policy: &RetryPolicy) -> Result<String> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error: Option<HarvesterError> = None;

    for attempt in 0..max_attempts {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, url, "Retrying after delay");
            tokio::time::sleep(delay).await;
        }

        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        status = %status,
                        attempt = attempt + 1,
                        max_attempts,
                        url,
                        "Server error"
                    );
                    last_error = Some(HarvesterError::UpstreamStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                    continue;
                }

                if !status.is_success() {
                    return Err(HarvesterError::UpstreamStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }

                return response.text().await.map_err(|source| HarvesterError::Transport {
                    url: url.to_string(),
                    source,
                });
            }
            Err(e) if e.is_connect() || e.is_timeout() => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_attempts,
                    url,
                    "Connection error"
                );
                last_error = Some(HarvesterError::Transport {
                    url: url.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                return Err(HarvesterError::Transport {
                    url: url.to_string(),
                    source: e,
                });
            }
        }
    }

    match last_error {
        // A single attempt surfaces the underlying error unchanged
        Some(e) if max_attempts == 1 => Err(e),
        Some(e) => Err(HarvesterError::RetriesExhausted {
            url: url.to_string(),
            attempts: max_attempts,
            message: e.to_string(),
        }),
        None => Err(HarvesterError::RetriesExhausted {
            url: url.to_string(),
            attempts: max_attempts,
            message: "Unknown error".to_string(),
        }),
    }
}

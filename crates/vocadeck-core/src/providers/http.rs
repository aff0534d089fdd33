//! Shared HTTP plumbing for providers: bounded rate-limit retry

use crate::config::ProviderSettings;
use crate::error::{Result, VocadeckError};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;

/// How a provider reacts to HTTP 429
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries of the same request before giving up on it
    pub max_retries: u32,

    /// Wait used when Retry-After is missing or unparsable
    pub default_retry_after: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            default_retry_after: Duration::from_secs(settings.default_retry_after_secs),
        }
    }
}

/// Read Retry-After as delta seconds
pub fn parse_retry_after(headers: &HeaderMap, default: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Build an HTTP client with the provider's request timeout
pub(crate) fn build_client(settings: &ProviderSettings) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .user_agent(crate::USER_AGENT)
        .build()?)
}

/// Send a request, sleeping out 429 responses up to `policy.max_retries` times
///
/// After the last permitted retry is also rate limited the call fails with
/// [`VocadeckError::RateLimited`] so the caller can move to its next query.
pub(crate) async fn send_with_retry(
    provider: &str,
    request: reqwest::RequestBuilder,
    policy: &RetryPolicy,
) -> Result<reqwest::Response> {
    let mut attempt: u32 = 0;

    loop {
        let req = request.try_clone().ok_or_else(|| {
            VocadeckError::Provider(format!("{}: failed to clone request", provider))
        })?;

        let response = req.send().await?;
        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        attempt += 1;
        if attempt > policy.max_retries {
            tracing::warn!(
                "{} rate limit persisted after {} attempts, giving up on this query",
                provider,
                attempt
            );
            return Err(VocadeckError::RateLimited {
                provider: provider.to_string(),
                attempts: attempt,
            });
        }

        let wait = parse_retry_after(response.headers(), policy.default_retry_after);
        tracing::warn!(
            "{} rate limit exceeded. Retrying after {} seconds (attempt {}/{})",
            provider,
            wait.as_secs(),
            attempt,
            policy.max_retries
        );
        tokio::time::sleep(wait).await;
    }
}

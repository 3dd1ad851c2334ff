//! HTTP transport for registry lookups
//!
//! One `reqwest` client is shared by every lookup of an audit. Requests that
//! hit rate limits, timeouts or server errors are retried with exponential
//! backoff; a 404 is reported as an unknown provider straight away.

use crate::error::RegistryError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Request timeout unless `--timeout` or the config file says otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("tfvc/", env!("CARGO_PKG_VERSION"));

/// Retries after the first attempt
const MAX_RETRIES: u32 = 3;

/// Delay before the first retry; doubles each time
const BASE_DELAY: Duration = Duration::from_millis(100);

/// Registry HTTP client with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

/// What to do after one request
enum Attempt {
    Done(reqwest::Response),
    Retry(RegistryError),
    Fail(RegistryError),
}

impl HttpClient {
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                RegistryError::network_error(
                    "",
                    "HTTP client",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;
        Ok(Self { client })
    }

    async fn attempt(&self, url: &str, subject: &str, registry: &str) -> Attempt {
        match self.client.get(url).send().await {
            Ok(response) => match status_error(response.status(), subject, registry) {
                None => Attempt::Done(response),
                Some((err, true)) => Attempt::Retry(err),
                Some((err, false)) => Attempt::Fail(err),
            },
            Err(e) if e.is_timeout() => Attempt::Retry(RegistryError::timeout(subject, registry)),
            Err(e) => Attempt::Retry(RegistryError::network_error(subject, registry, e.to_string())),
        }
    }

    /// GET `url` and decode the JSON body
    ///
    /// `subject` names what is being looked up (a provider or a host) and
    /// `registry` the registry host; both only feed error messages.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        subject: &str,
        registry: &str,
    ) -> Result<T, RegistryError> {
        let mut retries = 0;
        let response = loop {
            match self.attempt(url, subject, registry).await {
                Attempt::Done(response) => break response,
                Attempt::Fail(err) => return Err(err),
                Attempt::Retry(err) if retries >= MAX_RETRIES => return Err(err),
                Attempt::Retry(err) => {
                    let delay = backoff(retries);
                    debug!(url, retries, ?delay, error = %err, "Retrying registry request");
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
            }
        };

        response.json::<T>().await.map_err(|e| RegistryError::InvalidResponse {
            provider: subject.to_string(),
            registry: registry.to_string(),
            message: format!("failed to parse JSON: {}", e),
        })
    }
}

/// Delay before retry number `retries` (zero based)
fn backoff(retries: u32) -> Duration {
    BASE_DELAY.saturating_mul(2u32.saturating_pow(retries))
}

/// Map a response status to an error, paired with whether it is retryable
fn status_error(
    status: StatusCode,
    subject: &str,
    registry: &str,
) -> Option<(RegistryError, bool)> {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Some((RegistryError::rate_limit_exceeded(registry), true)),
        StatusCode::NOT_FOUND => Some((RegistryError::provider_not_found(subject, registry), false)),
        s if s.is_success() => None,
        s => Some((
            RegistryError::network_error(subject, registry, format!("HTTP {}", s)),
            s.is_server_error(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new().is_ok());
        assert!(HttpClient::with_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff(0), Duration::from_millis(100));
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(400));
        assert!(backoff(u32::MAX) >= backoff(MAX_RETRIES));
    }

    #[test]
    fn test_success_is_not_an_error() {
        assert!(status_error(StatusCode::OK, "hashicorp/aws", "registry.terraform.io").is_none());
    }

    #[test]
    fn test_not_found_fails_immediately() {
        let (err, retry) =
            status_error(StatusCode::NOT_FOUND, "hashicorp/gone", "registry.terraform.io").unwrap();
        assert!(!retry);
        assert!(matches!(err, RegistryError::ProviderNotFound { .. }));
    }

    #[test]
    fn test_rate_limit_and_server_errors_retry() {
        let (err, retry) =
            status_error(StatusCode::TOO_MANY_REQUESTS, "hashicorp/aws", "example.com").unwrap();
        assert!(retry);
        assert!(matches!(err, RegistryError::RateLimitExceeded { .. }));

        let (_, retry) =
            status_error(StatusCode::BAD_GATEWAY, "hashicorp/aws", "example.com").unwrap();
        assert!(retry);
    }

    #[test]
    fn test_client_errors_do_not_retry() {
        let (err, retry) =
            status_error(StatusCode::FORBIDDEN, "hashicorp/aws", "example.com").unwrap();
        assert!(!retry);
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_user_agent_names_tool() {
        assert!(USER_AGENT.starts_with("tfvc/"));
    }
}

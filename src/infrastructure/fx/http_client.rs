//! # HTTP Client
//!
//! Thin reqwest wrapper that maps transport failures and HTTP statuses onto
//! [`FxProviderError`], keeping the transient/permanent split the retry
//! policy relies on.

use crate::infrastructure::fx::error::{FxProviderError, FxProviderResult};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client wrapper for FX providers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Inner reqwest client.
    client: Client,
    /// Request timeout in milliseconds.
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a new HTTP client with the specified timeout.
    ///
    /// # Arguments
    ///
    /// * `timeout_ms` - Request timeout in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `FxProviderError::Internal` if the client cannot be created.
    pub fn new(timeout_ms: u64) -> FxProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| FxProviderError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout_ms })
    }

    /// Returns the configured timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Makes a GET request with query parameters and headers and
    /// deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `FxProviderError::Timeout` or `FxProviderError::Connection` on
    /// transport failure, a status-specific error for non-2xx responses, and
    /// `FxProviderError::Protocol` if the body cannot be parsed.
    pub async fn get_with_params_and_headers<T, P>(
        &self,
        url: &str,
        params: &P,
        headers: HeaderMap,
    ) -> FxProviderResult<T>
    where
        T: DeserializeOwned,
        P: serde::Serialize + ?Sized,
    {
        let response = self
            .client
            .get(url)
            .query(params)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        self.handle_response(response).await
    }

    /// Handles the HTTP response, checking status and deserializing JSON.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> FxProviderResult<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| FxProviderError::protocol(format!("Failed to parse response: {e}")))
        } else {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            let error_body = response.text().await.unwrap_or_default();
            Err(self.map_status_error(status, &error_body, retry_after_ms))
        }
    }

    /// Maps a reqwest error to an FxProviderError.
    fn map_reqwest_error(&self, error: reqwest::Error) -> FxProviderError {
        if error.is_timeout() {
            FxProviderError::timeout_with_duration("Request timed out", self.timeout_ms)
        } else if error.is_connect() {
            FxProviderError::connection(format!("Connection failed: {error}"))
        } else if error.is_decode() {
            FxProviderError::protocol(format!("Malformed response: {error}"))
        } else {
            FxProviderError::connection(format!("HTTP request failed: {error}"))
        }
    }

    /// Maps an HTTP status code to an FxProviderError.
    fn map_status_error(
        &self,
        status: StatusCode,
        body: &str,
        retry_after_ms: Option<u64>,
    ) -> FxProviderError {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                FxProviderError::invalid_request(format!("Bad request: {body}"))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                FxProviderError::authentication(format!("Authentication failed: {body}"))
            }
            StatusCode::NOT_FOUND => {
                FxProviderError::protocol(format!("Resource not found: {body}"))
            }
            StatusCode::TOO_MANY_REQUESTS => match retry_after_ms {
                Some(ms) => FxProviderError::rate_limited_with_retry("Rate limit exceeded", ms),
                None => FxProviderError::rate_limited("Rate limit exceeded"),
            },
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                FxProviderError::timeout(format!("Upstream timeout ({status}): {body}"))
            }
            s if s.is_server_error() => {
                FxProviderError::connection(format!("Server error ({status}): {body}"))
            }
            _ => FxProviderError::protocol(format!("HTTP error ({status}): {body}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_client() {
        let client = HttpClient::new(5000);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().timeout_ms(), 5000);
    }

    mod status_mapping {
        use super::*;

        fn map(status: StatusCode) -> FxProviderError {
            HttpClient::new(1000)
                .unwrap()
                .map_status_error(status, "body", None)
        }

        #[test]
        fn server_errors_are_retryable() {
            assert!(map(StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
            assert!(map(StatusCode::BAD_GATEWAY).is_retryable());
            assert!(map(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
            assert!(map(StatusCode::GATEWAY_TIMEOUT).is_retryable());
        }

        #[test]
        fn client_errors_are_permanent() {
            assert!(!map(StatusCode::BAD_REQUEST).is_retryable());
            assert!(!map(StatusCode::UNAUTHORIZED).is_retryable());
            assert!(!map(StatusCode::FORBIDDEN).is_retryable());
            assert!(!map(StatusCode::NOT_FOUND).is_retryable());
        }

        #[test]
        fn too_many_requests_keeps_hint() {
            let error = HttpClient::new(1000).unwrap().map_status_error(
                StatusCode::TOO_MANY_REQUESTS,
                "",
                Some(2000),
            );
            assert!(error.is_retryable());
            assert_eq!(error.retry_after_ms(), Some(2000));
        }
    }
}

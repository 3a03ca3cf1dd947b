//! # FX Provider Errors
//!
//! Error type for FX rate lookups.
//!
//! The pipeline's retry policy only re-attempts errors for which
//! [`FxProviderError::is_retryable`] is true.
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::infrastructure::fx::error::FxProviderError;
//!
//! let error = FxProviderError::timeout("no response after 5000ms");
//! assert!(error.is_retryable());
//!
//! let error = FxProviderError::authentication("invalid API key");
//! assert!(!error.is_retryable());
//! ```

use thiserror::Error;

/// Error type for FX rate provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxProviderError {
    /// Request timed out.
    #[error("fx provider timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
        /// Timeout duration in milliseconds.
        timeout_ms: Option<u64>,
    },

    /// Network, connection or upstream server failure.
    #[error("fx provider connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("fx provider rate limit exceeded: {message}")]
    RateLimited {
        /// Error message.
        message: String,
        /// Retry after duration in milliseconds.
        retry_after_ms: Option<u64>,
    },

    /// Credentials rejected.
    #[error("fx provider authentication error: {message}")]
    Authentication {
        /// Error message.
        message: String,
    },

    /// Request parameters rejected.
    #[error("fx provider invalid request: {message}")]
    InvalidRequest {
        /// Error message.
        message: String,
    },

    /// Response could not be understood.
    #[error("fx provider protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },

    /// Client-side failure unrelated to the provider.
    #[error("fx provider internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl FxProviderError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: None,
        }
    }

    /// Creates a timeout error with duration.
    #[must_use]
    pub fn timeout_with_duration(message: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_ms: None,
        }
    }

    /// Creates a rate limited error with a retry hint.
    #[must_use]
    pub fn rate_limited_with_retry(message: impl Into<String>, retry_after_ms: u64) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_ms: Some(retry_after_ms),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error is transient and the call may succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::RateLimited { .. }
        )
    }

    /// Returns the retry delay in milliseconds, if the provider supplied one.
    #[must_use]
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }
}

/// Result type for FX provider operations.
pub type FxProviderResult<T> = Result<T, FxProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(FxProviderError::timeout("t").is_retryable());
        assert!(FxProviderError::connection("c").is_retryable());
        assert!(FxProviderError::rate_limited("r").is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!FxProviderError::authentication("a").is_retryable());
        assert!(!FxProviderError::invalid_request("i").is_retryable());
        assert!(!FxProviderError::protocol("p").is_retryable());
        assert!(!FxProviderError::internal("x").is_retryable());
    }

    #[test]
    fn retry_hint() {
        let error = FxProviderError::rate_limited_with_retry("slow down", 1500);
        assert_eq!(error.retry_after_ms(), Some(1500));
        assert_eq!(FxProviderError::timeout("t").retry_after_ms(), None);
    }

    #[test]
    fn display_format() {
        let display = FxProviderError::timeout_with_duration("no response", 5000).to_string();
        assert!(display.contains("timeout"));
        assert!(display.contains("no response"));
    }
}

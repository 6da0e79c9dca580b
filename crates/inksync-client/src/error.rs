//! Error types for the e-signature API client.

use thiserror::Error;

/// Errors that can occur while talking to the e-signature service.
#[derive(Debug, Error)]
pub enum EsignError {
    // ── Configuration / credential errors (fatal, never retried) ──
    /// The client configuration or integration credential is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },

    // ── Service responses ──
    /// The service rejected the request outright (a 4xx other than 429).
    #[error("request rejected with {status} {reason}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
        /// Response headers, rendered for the error report.
        headers: String,
    },

    /// Server-side failure (5xx).
    #[error("server error {status}: {detail}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body, or the headers when the body was empty.
        detail: String,
    },

    /// The service asked us to slow down (429).
    #[error("rate limited by the service")]
    RateLimited {
        /// Parsed `Retry-After` header, when the service sent one.
        retry_after_secs: Option<u64>,
    },

    // ── Transport and decoding ──
    /// Transport-level failure (connection refused, DNS, TLS).
    #[error("network error: {message}")]
    Network {
        /// Underlying transport error.
        message: String,
    },

    /// The request exceeded the configured timeout.
    #[error("request timed out: {message}")]
    Timeout {
        /// Underlying timeout error.
        message: String,
    },

    /// The response body could not be parsed.
    #[error("parse error: {message}")]
    Parse {
        /// What failed to parse.
        message: String,
    },

    // ── Retry bookkeeping ──
    /// The retry budget was exhausted without a success.
    #[error("giving up after {attempts} attempt(s): {message}")]
    RetriesExhausted {
        /// Total attempts made, including the first.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },
}

impl EsignError {
    /// Create an invalid-configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Whether another attempt at the same request could succeed.
    ///
    /// Server errors, throttling, and transport failures are worth
    /// retrying; rejections and configuration errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Server { .. } | Self::RateLimited { .. } | Self::Network { .. } | Self::Timeout { .. }
        )
    }
}

impl From<reqwest::Error> for EsignError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                message: error.to_string(),
            }
        } else {
            Self::Network {
                message: error.to_string(),
            }
        }
    }
}

/// Result type for e-signature API operations.
pub type EsignResult<T> = Result<T, EsignError>;

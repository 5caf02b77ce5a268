//! # Provider Errors
//!
//! Error types for external rate-provider operations.
//!
//! The taxonomy drives the retry behavior in
//! [`ResilientInvoker`](crate::infrastructure::providers::resilience::ResilientInvoker):
//! transient failures are retried with backoff, configuration failures are
//! fatal at client construction, and invalid payloads are surfaced as
//! diagnostics while other providers are still tried.
//!
//! # Examples
//!
//! ```
//! use fx_rates_engine::infrastructure::providers::error::ProviderError;
//!
//! let error = ProviderError::timeout("exchange_rate", "request timed out after 10s");
//! assert!(error.is_retryable());
//!
//! let error = ProviderError::configuration("fixer", "FIXER_API_KEY is not set");
//! assert!(error.is_fatal());
//! ```

use thiserror::Error;

/// Error type for provider client operations.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Missing or invalid credential/configuration. Fatal, never retried.
    #[error("provider '{provider}' configuration error: {message}")]
    Configuration {
        /// Provider name.
        provider: String,
        /// Error message.
        message: String,
    },

    /// Request timed out.
    #[error("provider '{provider}' timeout: {message}")]
    Timeout {
        /// Provider name.
        provider: String,
        /// Error message.
        message: String,
    },

    /// Network or connection failure.
    #[error("provider '{provider}' connection error: {message}")]
    Connection {
        /// Provider name.
        provider: String,
        /// Error message.
        message: String,
    },

    /// Rate limit exceeded upstream.
    #[error("provider '{provider}' rate limited: {message}")]
    RateLimited {
        /// Provider name.
        provider: String,
        /// Error message.
        message: String,
    },

    /// The request cannot be served by this provider's API shape.
    #[error("provider '{provider}' invalid request: {message}")]
    InvalidRequest {
        /// Provider name.
        provider: String,
        /// Error message.
        message: String,
    },

    /// Malformed or unsuccessful payload, with the source's own error
    /// code/message embedded for diagnostics.
    #[error("provider '{provider}' invalid response: {message}")]
    InvalidResponse {
        /// Provider name.
        provider: String,
        /// Error message.
        message: String,
        /// Upstream error code, when the source reports one.
        error_code: Option<String>,
    },

    /// The circuit breaker for this provider is open; no network call was
    /// attempted.
    #[error("provider '{provider}' circuit breaker is open")]
    BreakerOpen {
        /// Provider name.
        provider: String,
    },
}

impl ProviderError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a rate-limited error.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-request error.
    #[must_use]
    pub fn invalid_request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
            error_code: None,
        }
    }

    /// Creates an invalid-response error carrying the upstream error code.
    #[must_use]
    pub fn invalid_response_with_code(
        provider: impl Into<String>,
        message: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
            error_code: Some(error_code.into()),
        }
    }

    /// Creates a breaker-open error.
    #[must_use]
    pub fn breaker_open(provider: impl Into<String>) -> Self {
        Self::BreakerOpen {
            provider: provider.into(),
        }
    }

    /// Returns true if a retry with backoff may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::RateLimited { .. }
        )
    }

    /// Returns true if the failure is fatal for this provider (no retry,
    /// no point calling again until reconfigured).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns true if the breaker short-circuited the call.
    #[must_use]
    pub fn is_breaker_open(&self) -> bool {
        matches!(self, Self::BreakerOpen { .. })
    }

    /// Returns the provider name this error belongs to.
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::Configuration { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Connection { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::InvalidRequest { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::BreakerOpen { provider } => provider,
        }
    }

    /// Returns the upstream error code, if the source reported one.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::InvalidResponse { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

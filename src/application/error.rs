//! # Application Errors
//!
//! Error types for the application layer.
//!
//! Service methods return [`EngineError`], which folds together the three
//! failure sources a use case can hit: domain rule violations, provider
//! failures, and store failures.
//!
//! # Examples
//!
//! ```
//! use fx_rates_engine::application::error::EngineError;
//! use fx_rates_engine::domain::errors::DomainError;
//!
//! let err: EngineError = DomainError::SameCurrency { code: "USD".into() }.into();
//! assert!(err.to_string().contains("cannot both be"));
//! ```

use crate::application::services::rate_fetcher::FetchError;
use crate::domain::errors::DomainError;
use crate::infrastructure::persistence::StoreError;
use crate::infrastructure::providers::ProviderError;
use thiserror::Error;

/// Error type for application services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A single provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A fan-out fetch produced no usable payload.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Rate store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input validation failure.
    #[error("validation error: {0}")]
    Validation(String),
}

impl EngineError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for application services.
pub type EngineResult<T> = Result<T, EngineError>;

//! # Provider Client Trait
//!
//! Port definition for external rate-quote providers.
//!
//! Every external source implements [`ProviderClient`] and normalizes its
//! native response shape into [`RateData`]. New sources are added by
//! implementing the trait and registering a constructor in the
//! [`registry`](crate::infrastructure::providers::registry); callers never
//! change.
//!
//! # Examples
//!
//! ```ignore
//! use fx_rates_engine::infrastructure::providers::traits::{ProviderClient, RateRequest};
//!
//! struct MyProviderClient { /* ... */ }
//!
//! #[async_trait::async_trait]
//! impl ProviderClient for MyProviderClient {
//!     // ... implement required methods
//! }
//! ```

use crate::domain::value_objects::Timestamp;
use crate::infrastructure::providers::error::ProviderResult;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The request shape a provider expects.
///
/// Map-shaped APIs quote every currency against one base per call;
/// pair-shaped APIs quote exactly one base/target pair per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// One call per base currency, returning a map of rates.
    PerBase,
    /// One call per currency pair.
    PerPair,
}

/// Parameters for one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    /// The base currency to quote from.
    base_currency: String,
    /// The target currency, for pair-shaped providers.
    target_currency: Option<String>,
}

impl RateRequest {
    /// Builds a request for all rates against one base currency.
    #[must_use]
    pub fn for_base(base: impl Into<String>) -> Self {
        Self {
            base_currency: base.into(),
            target_currency: None,
        }
    }

    /// Builds a request for one explicit base/target pair.
    #[must_use]
    pub fn for_pair(base: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            base_currency: base.into(),
            target_currency: Some(target.into()),
        }
    }

    /// Returns the base currency.
    #[inline]
    #[must_use]
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Returns the target currency, if the request is pair-shaped.
    #[inline]
    #[must_use]
    pub fn target_currency(&self) -> Option<&str> {
        self.target_currency.as_deref()
    }
}

impl fmt::Display for RateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target_currency {
            Some(target) => write!(f, "{}-{}", self.base_currency, target),
            None => write!(f, "{}-*", self.base_currency),
        }
    }
}

/// Normalized rate payload, identical regardless of the source's native
/// response shape.
///
/// Implementations are responsible for key-prefix stripping, timestamp
/// reformatting, and unit normalization before producing this type. The
/// fields stay string-keyed on purpose: structural validation in the
/// fetcher checks presence and non-emptiness before any domain parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateData {
    /// The base currency the rates are quoted against.
    pub base_code: String,
    /// Map of target currency code to quoted rate.
    pub conversion_rates: HashMap<String, Decimal>,
    /// Provider-reported time of the quote.
    pub last_update_at: Timestamp,
}

impl RateData {
    /// Returns the quoted rate for `target`, if present.
    #[must_use]
    pub fn rate_for(&self, target: &str) -> Option<Decimal> {
        self.conversion_rates.get(target).copied()
    }
}

/// Result of a provider health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealth {
    /// Whether the provider answered the probe.
    pub reachable: bool,
    /// Human-readable diagnostic detail.
    pub detail: String,
    /// When the probe ran.
    pub checked_at: Timestamp,
}

impl ProviderHealth {
    /// Creates a reachable probe result.
    #[must_use]
    pub fn reachable(detail: impl Into<String>) -> Self {
        Self {
            reachable: true,
            detail: detail.into(),
            checked_at: Timestamp::now(),
        }
    }

    /// Creates an unreachable probe result.
    #[must_use]
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            reachable: false,
            detail: detail.into(),
            checked_at: Timestamp::now(),
        }
    }
}

impl fmt::Display for ProviderHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.reachable {
            "reachable"
        } else {
            "unreachable"
        };
        write!(f, "{}: {}", status, self.detail)
    }
}

/// Trait implemented by every external rate provider.
///
/// # Error Handling
///
/// `fetch` returns `ProviderResult<RateData>`; implementations map their
/// native failures onto the
/// [`ProviderError`](crate::infrastructure::providers::error::ProviderError)
/// taxonomy so the invoker can decide what is retryable.
#[async_trait]
pub trait ProviderClient: Send + Sync + fmt::Debug {
    /// Returns the provider's registry name.
    fn name(&self) -> &'static str;

    /// Returns the request shape this provider expects.
    fn request_shape(&self) -> RequestShape {
        RequestShape::PerBase
    }

    /// Fetches quotes for the request and normalizes them to [`RateData`].
    ///
    /// # Errors
    ///
    /// - `ProviderError::Timeout` / `Connection` - transport failure
    /// - `ProviderError::InvalidResponse` - malformed or unsuccessful payload
    /// - `ProviderError::InvalidRequest` - request shape this API cannot serve
    async fn fetch(&self, request: &RateRequest) -> ProviderResult<RateData>;

    /// Probes the provider with its cheapest request.
    async fn health_check(&self) -> ProviderHealth;
}

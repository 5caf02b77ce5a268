//! # Rate Fetcher
//!
//! Concurrent fan-out over a set of resilient provider clients.
//!
//! All providers are queried at once; the first structurally valid payload
//! wins and the in-flight losers are dropped, which cancels them. A payload
//! that arrives malformed does not win: its rejection is recorded and the
//! race continues with whoever is still running. Only when every provider
//! has failed or produced an invalid payload does the fetch fail, and the
//! error then names every provider with its reason.

use crate::infrastructure::providers::resilience::ResilientInvoker;
use crate::infrastructure::providers::traits::{RateData, RateRequest};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// One provider's reason for not winning the race.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    /// Provider name.
    pub provider: &'static str,
    /// Why it lost: an error or a structural rejection.
    pub reason: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

/// Error type for fan-out fetches.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The fetcher was built with no providers.
    #[error("no providers configured")]
    NoProvidersConfigured,

    /// Every provider failed or returned an invalid payload.
    #[error("all providers failed: [{}]", format_failures(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),
}

fn format_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FetchError {
    /// Returns the per-provider failures, if any were collected.
    #[must_use]
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Self::NoProvidersConfigured => &[],
            Self::AllProvidersFailed(failures) => failures,
        }
    }
}

/// A winning payload tagged with the provider that produced it.
#[derive(Debug, Clone)]
pub struct ProviderPayload {
    /// The provider that won the race.
    pub provider: &'static str,
    /// The normalized payload.
    pub data: RateData,
}

/// Races a set of resilient provider clients and keeps the first valid
/// answer.
#[derive(Debug)]
pub struct RateFetcher {
    invokers: Vec<Arc<ResilientInvoker>>,
}

impl RateFetcher {
    /// Creates a fetcher over the given invokers.
    #[must_use]
    pub fn new(invokers: Vec<Arc<ResilientInvoker>>) -> Self {
        Self { invokers }
    }

    /// Returns the wrapped invokers.
    #[must_use]
    pub fn invokers(&self) -> &[Arc<ResilientInvoker>] {
        &self.invokers
    }

    /// Returns why a payload is structurally unusable, or `None` if it is
    /// fine. Validation is structural only; currency semantics are checked
    /// further up.
    fn structural_rejection(data: &RateData) -> Option<&'static str> {
        if data.base_code.is_empty() {
            Some("payload has an empty base_code")
        } else if data.conversion_rates.is_empty() {
            Some("payload has no conversion rates")
        } else {
            None
        }
    }

    /// Fans `request` out to every provider and returns the first
    /// structurally valid payload.
    ///
    /// # Errors
    ///
    /// [`FetchError::NoProvidersConfigured`] if the fetcher is empty,
    /// [`FetchError::AllProvidersFailed`] naming every provider and its
    /// reason otherwise.
    pub async fn fetch_first_valid(
        &self,
        request: &RateRequest,
    ) -> Result<ProviderPayload, FetchError> {
        if self.invokers.is_empty() {
            return Err(FetchError::NoProvidersConfigured);
        }

        let mut in_flight: FuturesUnordered<_> = self
            .invokers
            .iter()
            .map(|invoker| {
                let invoker = Arc::clone(invoker);
                let request = request.clone();
                async move {
                    let provider = invoker.provider_name();
                    (provider, invoker.fetch(&request).await)
                }
            })
            .collect();

        let mut failures = Vec::with_capacity(self.invokers.len());
        while let Some((provider, result)) = in_flight.next().await {
            match result {
                Ok(data) => match Self::structural_rejection(&data) {
                    None => {
                        debug!(provider, request = %request, "first valid payload won");
                        // Dropping the stream cancels the losers.
                        return Ok(ProviderPayload { provider, data });
                    }
                    Some(reason) => {
                        warn!(provider, reason, "rejecting structurally invalid payload");
                        failures.push(ProviderFailure {
                            provider,
                            reason: reason.to_string(),
                        });
                    }
                },
                Err(error) => {
                    warn!(provider, %error, "provider failed");
                    failures.push(ProviderFailure {
                        provider,
                        reason: error.to_string(),
                    });
                }
            }
        }

        Err(FetchError::AllProvidersFailed(failures))
    }
}

//! # Polygon.io Client
//!
//! Client for the Polygon.io currency conversion endpoint.
//!
//! Unlike the map-shaped providers, Polygon quotes exactly one pair per
//! call (`GET /v1/conversion/{from}/{to}`), so the client is pair-shaped
//! and its normalized payload carries a single-entry rate map.

use crate::domain::value_objects::Timestamp;
use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use crate::infrastructure::providers::http_client::HttpClient;
use crate::infrastructure::providers::traits::{
    ProviderClient, ProviderHealth, RateData, RateRequest, RequestShape,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Registry name for this provider.
pub const PROVIDER_NAME: &str = "polygon";

const DEFAULT_BASE_URL: &str = "https://api.polygon.io";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for [`PolygonClient`].
#[derive(Debug, Clone)]
pub struct PolygonConfig {
    /// API key; required.
    pub api_key: Option<String>,
    /// Endpoint root, overridable for tests.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for PolygonConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Last-quote block of a conversion response.
#[derive(Debug, Deserialize)]
struct LastQuote {
    ask: Decimal,
    /// Quote time in unix milliseconds.
    timestamp: i64,
}

/// Wire shape of a `/v1/conversion/{from}/{to}` response.
#[derive(Debug, Deserialize)]
struct ConversionResponse {
    status: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    last: Option<LastQuote>,
}

/// Polygon.io conversion client.
#[derive(Debug)]
pub struct PolygonClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl PolygonClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if the API key is missing.
    pub fn new(config: PolygonConfig) -> ProviderResult<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            ProviderError::configuration(PROVIDER_NAME, "POLYGON_API_KEY is not set")
        })?;

        Ok(Self {
            http: HttpClient::new(PROVIDER_NAME, config.timeout_ms)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProviderClient for PolygonClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn request_shape(&self) -> RequestShape {
        RequestShape::PerPair
    }

    async fn fetch(&self, request: &RateRequest) -> ProviderResult<RateData> {
        let target = request.target_currency().ok_or_else(|| {
            ProviderError::invalid_request(
                PROVIDER_NAME,
                "conversion endpoint requires an explicit target currency",
            )
        })?;

        let url = format!(
            "{}/v1/conversion/{}/{}",
            self.base_url,
            request.base_currency(),
            target
        );
        let payload: ConversionResponse = self
            .http
            .get_with_params(
                &url,
                &[
                    ("amount", "1"),
                    ("precision", "8"),
                    ("apiKey", self.api_key.as_str()),
                ],
            )
            .await?;

        if payload.status != "success" {
            return Err(ProviderError::invalid_response_with_code(
                PROVIDER_NAME,
                format!("API returned status '{}'", payload.status),
                payload.status,
            ));
        }

        let last = payload.last.ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_NAME, "response is missing last quote")
        })?;
        let base_code = payload
            .from
            .unwrap_or_else(|| request.base_currency().to_string());
        let target = payload.to.unwrap_or_else(|| target.to_string());

        let last_update_at = Timestamp::from_unix_millis(last.timestamp).ok_or_else(|| {
            ProviderError::invalid_response(
                PROVIDER_NAME,
                format!("unrepresentable quote timestamp {}", last.timestamp),
            )
        })?;

        Ok(RateData {
            base_code,
            conversion_rates: HashMap::from([(target, last.ask)]),
            last_update_at,
        })
    }

    async fn health_check(&self) -> ProviderHealth {
        match self.fetch(&RateRequest::for_pair("EUR", "USD")).await {
            Ok(data) => ProviderHealth::reachable(format!("quoted {}", data.base_code)),
            Err(error) => ProviderHealth::unreachable(error.to_string()),
        }
    }
}

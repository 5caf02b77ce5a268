//! # ExchangeRate-API Client
//!
//! Client for the ExchangeRate-API v6 REST endpoint.
//!
//! The API quotes every supported currency against one base per call
//! (`GET {base_url}/{api_key}/latest/{BASE}`), so this client is
//! base-shaped and its payload maps onto [`RateData`] almost directly.

use crate::domain::value_objects::Timestamp;
use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use crate::infrastructure::providers::http_client::HttpClient;
use crate::infrastructure::providers::traits::{
    ProviderClient, ProviderHealth, RateData, RateRequest,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Registry name for this provider.
pub const PROVIDER_NAME: &str = "exchange_rate";

const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for [`ExchangeRateApiClient`].
#[derive(Debug, Clone)]
pub struct ExchangeRateApiConfig {
    /// API key; required.
    pub api_key: Option<String>,
    /// Endpoint root, overridable for tests.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ExchangeRateApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Wire shape of a `latest/{BASE}` response.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    conversion_rates: Option<HashMap<String, Decimal>>,
    #[serde(default)]
    time_last_update_unix: Option<i64>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
}

/// ExchangeRate-API v6 client.
#[derive(Debug)]
pub struct ExchangeRateApiClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl ExchangeRateApiClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if the API key is missing.
    pub fn new(config: ExchangeRateApiConfig) -> ProviderResult<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            ProviderError::configuration(PROVIDER_NAME, "EXCHANGE_RATE_API_KEY is not set")
        })?;

        Ok(Self {
            http: HttpClient::new(PROVIDER_NAME, config.timeout_ms)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProviderClient for ExchangeRateApiClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(&self, request: &RateRequest) -> ProviderResult<RateData> {
        let url = format!(
            "{}/{}/latest/{}",
            self.base_url,
            self.api_key,
            request.base_currency()
        );
        let payload: LatestResponse = self.http.get(&url).await?;

        if payload.result != "success" {
            let code = payload.error_type.unwrap_or_else(|| "unknown".to_string());
            return Err(ProviderError::invalid_response_with_code(
                PROVIDER_NAME,
                format!("API returned result '{}'", code),
                code.clone(),
            ));
        }

        let base_code = payload.base_code.ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_NAME, "response is missing base_code")
        })?;
        let conversion_rates = payload.conversion_rates.ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_NAME, "response is missing conversion_rates")
        })?;
        let last_update_at = payload
            .time_last_update_unix
            .and_then(Timestamp::from_unix_secs)
            .unwrap_or_else(Timestamp::now);

        Ok(RateData {
            base_code,
            conversion_rates,
            last_update_at,
        })
    }

    async fn health_check(&self) -> ProviderHealth {
        match self.fetch(&RateRequest::for_base("USD")).await {
            Ok(data) => ProviderHealth::reachable(format!(
                "{} rates against {}",
                data.conversion_rates.len(),
                data.base_code
            )),
            Err(error) => ProviderHealth::unreachable(error.to_string()),
        }
    }
}

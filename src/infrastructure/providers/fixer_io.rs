//! # Fixer.io Client
//!
//! Client for the Fixer.io `latest` endpoint.
//!
//! The free plan quotes against EUR only, so this client rejects any
//! other base up front instead of paying for a request that the API
//! would refuse.

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
pub const PROVIDER_NAME: &str = "fixer";

/// The only base currency the free plan serves.
pub const SUPPORTED_BASE: &str = "EUR";

const DEFAULT_BASE_URL: &str = "http://data.fixer.io/api";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for [`FixerIoClient`].
#[derive(Debug, Clone)]
pub struct FixerIoConfig {
    /// API key; required.
    pub api_key: Option<String>,
    /// Endpoint root, overridable for tests.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for FixerIoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FixerErrorBody {
    code: Option<u32>,
    info: Option<String>,
}

/// Wire shape of a `latest` response.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    success: bool,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    rates: Option<HashMap<String, Decimal>>,
    #[serde(default)]
    error: Option<FixerErrorBody>,
}

/// Fixer.io client.
#[derive(Debug)]
pub struct FixerIoClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl FixerIoClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if the API key is missing.
    pub fn new(config: FixerIoConfig) -> ProviderResult<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            ProviderError::configuration(PROVIDER_NAME, "FIXER_API_KEY is not set")
        })?;

        Ok(Self {
            http: HttpClient::new(PROVIDER_NAME, config.timeout_ms)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProviderClient for FixerIoClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(&self, request: &RateRequest) -> ProviderResult<RateData> {
        if request.base_currency() != SUPPORTED_BASE {
            return Err(ProviderError::invalid_request(
                PROVIDER_NAME,
                format!(
                    "only {} base is supported, got {}",
                    SUPPORTED_BASE,
                    request.base_currency()
                ),
            ));
        }

        let url = format!("{}/latest", self.base_url);
        let payload: LatestResponse = self
            .http
            .get_with_params(&url, &[("access_key", self.api_key.as_str())])
            .await?;

        if !payload.success {
            let (code, info) = payload
                .error
                .map(|e| (e.code, e.info))
                .unwrap_or((None, None));
            let code = code.map_or_else(|| "unknown".to_string(), |c| c.to_string());
            return Err(ProviderError::invalid_response_with_code(
                PROVIDER_NAME,
                format!(
                    "API error {}: {}",
                    code,
                    info.unwrap_or_else(|| "no detail".to_string())
                ),
                code.clone(),
            ));
        }

        let base_code = payload.base.ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_NAME, "response is missing base")
        })?;
        let conversion_rates = payload.rates.ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_NAME, "response is missing rates")
        })?;
        let last_update_at = payload
            .timestamp
            .and_then(Timestamp::from_unix_secs)
            .unwrap_or_else(Timestamp::now);

        Ok(RateData {
            base_code,
            conversion_rates,
            last_update_at,
        })
    }

    async fn health_check(&self) -> ProviderHealth {
        match self.fetch(&RateRequest::for_base(SUPPORTED_BASE)).await {
            Ok(data) => ProviderHealth::reachable(format!(
                "{} rates against {}",
                data.conversion_rates.len(),
                data.base_code
            )),
            Err(error) => ProviderHealth::unreachable(error.to_string()),
        }
    }
}

//! # CurrencyLayer Client
//!
//! Client for the CurrencyLayer `live` endpoint.
//!
//! CurrencyLayer keys its quotes as `{SOURCE}{TARGET}` (for example
//! `"USDEUR"`), so this client strips the source prefix before producing
//! the normalized payload.

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
pub const PROVIDER_NAME: &str = "currency_layer";

const DEFAULT_BASE_URL: &str = "http://api.currencylayer.com";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for [`CurrencyLayerClient`].
#[derive(Debug, Clone)]
pub struct CurrencyLayerConfig {
    /// API key; required.
    pub api_key: Option<String>,
    /// Endpoint root, overridable for tests.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for CurrencyLayerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LiveErrorBody {
    code: Option<u32>,
    info: Option<String>,
}

/// Wire shape of a `live` response.
#[derive(Debug, Deserialize)]
struct LiveResponse {
    success: bool,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    quotes: Option<HashMap<String, Decimal>>,
    #[serde(default)]
    error: Option<LiveErrorBody>,
}

/// CurrencyLayer client.
#[derive(Debug)]
pub struct CurrencyLayerClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl CurrencyLayerClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if the API key is missing.
    pub fn new(config: CurrencyLayerConfig) -> ProviderResult<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            ProviderError::configuration(PROVIDER_NAME, "CURRENCY_LAYER_API_KEY is not set")
        })?;

        Ok(Self {
            http: HttpClient::new(PROVIDER_NAME, config.timeout_ms)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Turns `{SOURCE}{TARGET}` keyed quotes into target-keyed rates.
    fn strip_source_prefix(
        source: &str,
        quotes: HashMap<String, Decimal>,
    ) -> HashMap<String, Decimal> {
        quotes
            .into_iter()
            .filter_map(|(key, rate)| {
                key.strip_prefix(source)
                    .filter(|target| !target.is_empty())
                    .map(|target| (target.to_string(), rate))
            })
            .collect()
    }
}

#[async_trait]
impl ProviderClient for CurrencyLayerClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(&self, request: &RateRequest) -> ProviderResult<RateData> {
        let url = format!("{}/live", self.base_url);
        let payload: LiveResponse = self
            .http
            .get_with_params(
                &url,
                &[
                    ("access_key", self.api_key.as_str()),
                    ("source", request.base_currency()),
                ],
            )
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

        let source = payload.source.ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_NAME, "response is missing source")
        })?;
        let quotes = payload.quotes.ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_NAME, "response is missing quotes")
        })?;
        let last_update_at = payload
            .timestamp
            .and_then(Timestamp::from_unix_secs)
            .unwrap_or_else(Timestamp::now);

        Ok(RateData {
            conversion_rates: Self::strip_source_prefix(&source, quotes),
            base_code: source,
            last_update_at,
        })
    }

    async fn health_check(&self) -> ProviderHealth {
        match self.fetch(&RateRequest::for_base("USD")).await {
            Ok(data) => ProviderHealth::reachable(format!(
                "{} quotes against {}",
                data.conversion_rates.len(),
                data.base_code
            )),
            Err(error) => ProviderHealth::unreachable(error.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn missing_api_key_is_fatal() {
        let error = CurrencyLayerClient::new(CurrencyLayerConfig::default()).unwrap_err();
        assert!(error.is_fatal());
    }

    #[test]
    fn source_prefix_stripped_from_quote_keys() {
        let quotes = HashMap::from([
            ("USDEUR".to_string(), dec!(0.92)),
            ("USDZAR".to_string(), dec!(18.4)),
            ("GBPJPY".to_string(), dec!(190.0)),
        ]);
        let rates = CurrencyLayerClient::strip_source_prefix("USD", quotes);
        assert_eq!(rates.get("EUR"), Some(&dec!(0.92)));
        assert_eq!(rates.get("ZAR"), Some(&dec!(18.4)));
        // Keys quoted against a different source are dropped.
        assert_eq!(rates.len(), 2);
    }
}

//! # Provider Registry
//!
//! Name-to-constructor mapping for the built-in provider clients.
//!
//! Configuration names providers as strings; the registry turns each name
//! plus its settings into a boxed [`ProviderClient`]. Adding a source
//! means implementing the trait and adding one arm here.

use crate::infrastructure::providers::currency_layer::{CurrencyLayerClient, CurrencyLayerConfig};
use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use crate::infrastructure::providers::exchange_rate_api::{
    ExchangeRateApiClient, ExchangeRateApiConfig,
};
use crate::infrastructure::providers::fixer_io::{FixerIoClient, FixerIoConfig};
use crate::infrastructure::providers::polygon::{PolygonClient, PolygonConfig};
use crate::infrastructure::providers::traits::ProviderClient;
use crate::infrastructure::providers::{currency_layer, exchange_rate_api, fixer_io, polygon};
use std::sync::Arc;

/// Settings shared by every provider constructor.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Endpoint root override; each client has its own default.
    pub base_url: Option<String>,
    /// Request timeout override in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// Names the registry can construct, in configuration order.
#[must_use]
pub fn known_providers() -> [&'static str; 4] {
    [
        exchange_rate_api::PROVIDER_NAME,
        fixer_io::PROVIDER_NAME,
        currency_layer::PROVIDER_NAME,
        polygon::PROVIDER_NAME,
    ]
}

/// Constructs the client registered under `name`.
///
/// # Errors
///
/// `ProviderError::Configuration` for an unknown name or a client whose
/// required settings are missing.
pub fn build_client(
    name: &str,
    settings: &ProviderSettings,
) -> ProviderResult<Arc<dyn ProviderClient>> {
    match name {
        exchange_rate_api::PROVIDER_NAME => {
            let defaults = ExchangeRateApiConfig::default();
            Ok(Arc::new(ExchangeRateApiClient::new(
                ExchangeRateApiConfig {
                    api_key: settings.api_key.clone(),
                    base_url: settings.base_url.clone().unwrap_or(defaults.base_url),
                    timeout_ms: settings.timeout_ms.unwrap_or(defaults.timeout_ms),
                },
            )?))
        }
        fixer_io::PROVIDER_NAME => {
            let defaults = FixerIoConfig::default();
            Ok(Arc::new(FixerIoClient::new(FixerIoConfig {
                api_key: settings.api_key.clone(),
                base_url: settings.base_url.clone().unwrap_or(defaults.base_url),
                timeout_ms: settings.timeout_ms.unwrap_or(defaults.timeout_ms),
            })?))
        }
        currency_layer::PROVIDER_NAME => {
            let defaults = CurrencyLayerConfig::default();
            Ok(Arc::new(CurrencyLayerClient::new(CurrencyLayerConfig {
                api_key: settings.api_key.clone(),
                base_url: settings.base_url.clone().unwrap_or(defaults.base_url),
                timeout_ms: settings.timeout_ms.unwrap_or(defaults.timeout_ms),
            })?))
        }
        polygon::PROVIDER_NAME => {
            let defaults = PolygonConfig::default();
            Ok(Arc::new(PolygonClient::new(PolygonConfig {
                api_key: settings.api_key.clone(),
                base_url: settings.base_url.clone().unwrap_or(defaults.base_url),
                timeout_ms: settings.timeout_ms.unwrap_or(defaults.timeout_ms),
            })?))
        }
        other => Err(ProviderError::configuration(
            other.to_string(),
            format!(
                "unknown provider '{}'; known providers: {}",
                other,
                known_providers().join(", ")
            ),
        )),
    }
}

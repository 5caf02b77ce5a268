//! # Engine Configuration
//!
//! Layered configuration: built-in defaults, an optional TOML file, then
//! `FX_`-prefixed environment variables, each layer overriding the last.
//! A `.env` file is honored for local development.
//!
//! # Examples
//!
//! ```no_run
//! use fx_rates_engine::config::EngineConfig;
//!
//! let config = EngineConfig::load().unwrap();
//! println!("enabled providers: {:?}", config.providers);
//! ```

use crate::application::services::aggregation_cycle::RateSource;
use crate::infrastructure::providers::registry::{self, ProviderSettings};
use crate::infrastructure::providers::resilience::{
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_MAX_RETRIES, ResilientInvoker, RetryPolicy,
};
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Retry settings for every provider invoker.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First retry delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Backoff multiplier per attempt.
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// Delay cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_factor() -> f64 {
    2.0
}
fn default_max_delay_ms() -> u64 {
    8_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            factor: default_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetrySettings {
    /// Converts to the invoker's policy type.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            factor: self.factor,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerSettings {
    /// Failures before the breaker opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
        }
    }
}

/// Per-provider connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderEntry {
    /// API key.
    pub api_key: Option<String>,
    /// Endpoint root override.
    pub base_url: Option<String>,
    /// Request timeout override in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl ProviderEntry {
    fn settings(&self) -> ProviderSettings {
        ProviderSettings {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Provider names to query each cycle, in registry vocabulary.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    /// Retry policy shared by all invokers.
    #[serde(default)]
    pub retry: RetrySettings,
    /// Circuit breaker settings shared by all invokers.
    #[serde(default)]
    pub breaker: BreakerSettings,
    /// Connection settings per provider name.
    #[serde(default)]
    pub provider_settings: HashMap<String, ProviderEntry>,
    /// Markup applied to newly added pairs.
    #[serde(default = "default_markup")]
    pub default_markup: Decimal,
}

fn default_providers() -> Vec<String> {
    registry::known_providers()
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_markup() -> Decimal {
    Decimal::new(10, 2)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            retry: RetrySettings::default(),
            breaker: BreakerSettings::default(),
            provider_settings: HashMap::new(),
            default_markup: default_markup(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from defaults, an optional `FX_CONFIG` file,
    /// and `FX_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on an unreadable file or undeserializable
    /// values.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Ok(path) = std::env::var("FX_CONFIG") {
            info!(path, "loading configuration file");
            builder = builder.add_source(File::with_name(&path));
        }
        builder = builder.add_source(
            Environment::with_prefix("FX")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("providers"),
        );

        builder.build()?.try_deserialize()
    }

    /// Returns the connection settings for `name`, empty if unset.
    #[must_use]
    pub fn settings_for(&self, name: &str) -> ProviderSettings {
        self.provider_settings
            .get(name)
            .map(ProviderEntry::settings)
            .unwrap_or_default()
    }

    /// Builds one [`RateSource`] per configured provider.
    ///
    /// # Errors
    ///
    /// Returns the first construction failure: an unknown provider name
    /// or a client with missing credentials.
    pub fn build_sources(
        &self,
    ) -> Result<Vec<RateSource>, crate::infrastructure::providers::ProviderError> {
        let policy = self.retry.policy();
        self.providers
            .iter()
            .map(|name| {
                let client = registry::build_client(name, &self.settings_for(name))?;
                Ok(RateSource::new(Arc::new(ResilientInvoker::with_policy(
                    client,
                    policy.clone(),
                    self.breaker.failure_threshold,
                ))))
            })
            .collect()
    }
}

//! # Rate Providers
//!
//! Clients for external foreign-exchange rate sources.
//!
//! ## Port
//!
//! - [`ProviderClient`]: trait every source implements
//! - [`RateData`]: normalized payload, identical across sources
//!
//! ## Built-in Clients
//!
//! - [`ExchangeRateApiClient`]: ExchangeRate-API v6, base-shaped
//! - [`FixerIoClient`]: Fixer.io, base-shaped, EUR base only
//! - [`CurrencyLayerClient`]: CurrencyLayer, base-shaped with prefixed keys
//! - [`PolygonClient`]: Polygon.io, pair-shaped
//!
//! ## Resilience
//!
//! Every client is called through a [`ResilientInvoker`], which owns the
//! client's retry policy and circuit breaker.

pub mod currency_layer;
pub mod error;
pub mod exchange_rate_api;
pub mod fixer_io;
pub mod http_client;
pub mod polygon;
pub mod registry;
pub mod resilience;
pub mod traits;

pub use currency_layer::{CurrencyLayerClient, CurrencyLayerConfig};
pub use error::{ProviderError, ProviderResult};
pub use exchange_rate_api::{ExchangeRateApiClient, ExchangeRateApiConfig};
pub use fixer_io::{FixerIoClient, FixerIoConfig};
pub use http_client::HttpClient;
pub use polygon::{PolygonClient, PolygonConfig};
pub use registry::{ProviderSettings, build_client, known_providers};
pub use resilience::{BreakerState, CircuitBreaker, ResilientInvoker, RetryPolicy};
pub use traits::{ProviderClient, ProviderHealth, RateData, RateRequest, RequestShape};

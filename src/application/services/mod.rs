//! # Application Services
//!
//! Use-case orchestration over the domain and infrastructure layers.
//!
//! - [`RateFetcher`]: concurrent first-valid-wins fan-out over providers
//! - [`RateAggregator`]: decimal averaging and markup application
//! - [`CurrencyNormalizer`]: direction-agnostic rate lookup
//! - [`AggregationCycle`]: end-to-end refresh with atomic commits

pub mod aggregation_cycle;
pub mod currency_normalizer;
pub mod rate_aggregator;
pub mod rate_fetcher;

pub use aggregation_cycle::{AggregationCycle, CycleReport, RateSource};
pub use currency_normalizer::{CurrencyNormalizer, CurrencyRate, CurrencyRates};
pub use rate_aggregator::RateAggregator;
pub use rate_fetcher::{FetchError, ProviderFailure, ProviderPayload, RateFetcher};

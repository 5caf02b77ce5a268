//! # FX Rates Engine
//!
//! Foreign-exchange rate acquisition and aggregation engine.
//!
//! The engine queries a configurable set of external rate providers,
//! averages their quotes per currency pair with decimal arithmetic,
//! applies a per-pair markup, and persists each refresh atomically.
//! Lookups are direction-agnostic: a pair stored as `USD-ZAR` also
//! answers `ZAR` queries through bid/ask-swapped inversion, computed on
//! read and never persisted.
//!
//! ## Architecture
//!
//! - `domain`: entities and value objects, no I/O
//! - `application`: fetch fan-out, aggregation, normalization, and the
//!   cycle orchestrator
//! - `infrastructure`: provider HTTP clients with retry and circuit
//!   breaking, and the rate store port
//! - `config`: layered configuration and source wiring
//!
//! ## Example
//!
//! ```no_run
//! use fx_rates_engine::application::services::AggregationCycle;
//! use fx_rates_engine::config::EngineConfig;
//! use fx_rates_engine::infrastructure::persistence::{InMemoryRateStore, RateStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::load()?;
//! let store = Arc::new(InMemoryRateStore::new());
//! let cycle = AggregationCycle::new(store as Arc<dyn RateStore>, config.build_sources()?);
//! let report = cycle.run().await?;
//! println!("cycle: {report}");
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::error::{EngineError, EngineResult};
pub use application::services::{
    AggregationCycle, CurrencyNormalizer, CycleReport, RateAggregator, RateFetcher, RateSource,
};
pub use config::EngineConfig;
pub use domain::entities::{AggregatedRate, CurrencyPair, DerivedRate, RateObservation};
pub use domain::value_objects::{CurrencyCode, Markup, PairId, Timestamp};
pub use infrastructure::persistence::{CycleBatch, InMemoryRateStore, RateStore};
pub use infrastructure::providers::{ProviderClient, ResilientInvoker};

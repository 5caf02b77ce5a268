//! # Application Layer
//!
//! Services that implement the engine's use cases, plus the error type
//! they share.

pub mod error;
pub mod services;

pub use error::{EngineError, EngineResult};
pub use services::{AggregationCycle, CurrencyNormalizer, RateAggregator, RateFetcher};

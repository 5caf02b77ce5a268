//! # Domain Entities
//!
//! Core entities of the rate engine:
//!
//! - [`CurrencyPair`]: ordered base/target combination with markup
//! - [`RateObservation`]: one raw provider quote, append-only
//! - [`AggregatedRate`]: the reconciled per-cycle result
//! - [`DerivedRate`]: read-time inversion of a stored rate

pub mod aggregated_rate;
pub mod currency_pair;
pub mod rate_observation;

pub use aggregated_rate::{AggregatedRate, DerivedRate};
pub use currency_pair::CurrencyPair;
pub use rate_observation::RateObservation;

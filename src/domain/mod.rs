//! # Domain Layer
//!
//! Entities, value objects, and domain-level errors. No I/O here; every
//! type is constructible and testable without a runtime.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::{AggregatedRate, CurrencyPair, DerivedRate, RateObservation};
pub use errors::{DomainError, DomainResult};
pub use value_objects::{CurrencyCode, Markup, PairId, Timestamp};

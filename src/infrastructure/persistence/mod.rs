//! # Persistence Layer
//!
//! Rate storage behind a port.
//!
//! ## Port
//!
//! - [`RateStore`]: pairs, observations, aggregates, and atomic cycle
//!   commits
//!
//! ## Implementations
//!
//! - `in_memory`: single-process store used in tests and small
//!   deployments

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemoryRateStore;
pub use traits::{
    CycleBatch, HistoricalQuery, RateStore, SortOrder, StoreError, StoreResult,
};

//! # In-Memory Persistence
//!
//! In-memory implementation of the rate store port, used by tests and
//! by single-process deployments that do not need durability.

pub mod rate_store;

pub use rate_store::InMemoryRateStore;

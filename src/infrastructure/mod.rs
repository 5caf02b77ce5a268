//! # Infrastructure Layer
//!
//! Adapters to the outside world: provider HTTP clients with retry and
//! circuit breaking, and the rate store implementations behind the
//! persistence port.

pub mod persistence;
pub mod providers;

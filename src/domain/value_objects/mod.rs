//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! - [`CurrencyCode`]: validated 3-letter uppercase currency code
//! - [`Markup`]: fractional markup constrained to `[0, 1]`
//! - [`Timestamp`]: UTC timestamp wrapper
//! - [`PairId`]: currency pair identifier

pub mod currency_code;
pub mod ids;
pub mod markup;
pub mod timestamp;

pub use currency_code::CurrencyCode;
pub use ids::PairId;
pub use markup::Markup;
pub use timestamp::Timestamp;

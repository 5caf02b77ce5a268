//! # Markup Value Object
//!
//! Fractional commercial markup constrained to `[0, 1]`.
//!
//! The markup widens the spread around the averaged market rate: the buy
//! rate is marked up by `1 + m` and the sell rate marked down by `1 - m`.
//!
//! # Examples
//!
//! ```
//! use fx_rates_engine::domain::value_objects::markup::Markup;
//! use rust_decimal_macros::dec;
//!
//! let markup = Markup::new(dec!(0.10)).unwrap();
//! assert_eq!(markup.buy_multiplier(), dec!(1.10));
//! assert_eq!(markup.sell_multiplier(), dec!(0.90));
//!
//! assert!(Markup::new(dec!(1.5)).is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fractional markup in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Markup(Decimal);

impl Markup {
    /// The default markup applied to newly configured pairs.
    pub const DEFAULT: Decimal = dec!(0.10);

    /// Creates a markup, rejecting values outside `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MarkupOutOfRange`] if `value < 0` or `value > 1`.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(DomainError::markup_out_of_range(value));
        }
        Ok(Self(value))
    }

    /// Creates a zero markup.
    #[must_use]
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the raw fractional value.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Decimal {
        self.0
    }

    /// Returns `1 + m`, the multiplier applied to the averaged buy rate.
    #[must_use]
    pub fn buy_multiplier(&self) -> Decimal {
        Decimal::ONE + self.0
    }

    /// Returns `1 - m`, the multiplier applied to the averaged sell rate.
    #[must_use]
    pub fn sell_multiplier(&self) -> Decimal {
        Decimal::ONE - self.0
    }

    /// Returns true if this markup is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for Markup {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Markup {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Markup> for Decimal {
    fn from(markup: Markup) -> Self {
        markup.0
    }
}

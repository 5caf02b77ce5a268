//! # Currency Pair Entity
//!
//! An ordered `(base, target)` currency combination with its own markup
//! configuration.
//!
//! The base/target order is fixed at creation and never physically
//! inverted; opposite-direction lookups are served by deriving a rate at
//! read time (see
//! [`AggregatedRate::invert`](crate::domain::entities::aggregated_rate::AggregatedRate::invert)).
//!
//! # Examples
//!
//! ```
//! use fx_rates_engine::domain::entities::currency_pair::CurrencyPair;
//! use fx_rates_engine::domain::value_objects::{CurrencyCode, Markup};
//! use rust_decimal_macros::dec;
//!
//! let pair = CurrencyPair::new(
//!     CurrencyCode::new("USD").unwrap(),
//!     CurrencyCode::new("ZAR").unwrap(),
//!     Markup::new(dec!(0.10)).unwrap(),
//! ).unwrap();
//!
//! assert!(pair.is_active());
//! assert_eq!(pair.symbol(), "USD-ZAR");
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{CurrencyCode, Markup, PairId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered currency pair with markup configuration.
///
/// # Invariants
///
/// - `base_currency != target_currency`
/// - Markup always in `[0, 1]` (enforced by [`Markup`])
/// - Uniqueness per ordered pair, including the reverse ordering, is
///   enforced by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Unique identifier.
    id: PairId,
    /// The base (stored "from") currency.
    base_currency: CurrencyCode,
    /// The target (stored "to") currency.
    target_currency: CurrencyCode,
    /// Fractional markup applied at aggregation time.
    markup: Markup,
    /// Whether the pair participates in aggregation cycles.
    is_active: bool,
    /// When the pair was configured.
    created_at: Timestamp,
}

impl CurrencyPair {
    /// Creates an active pair with validation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::SameCurrency`] if base and target are equal.
    pub fn new(
        base_currency: CurrencyCode,
        target_currency: CurrencyCode,
        markup: Markup,
    ) -> DomainResult<Self> {
        if base_currency == target_currency {
            return Err(DomainError::SameCurrency {
                code: base_currency.as_str().to_string(),
            });
        }

        Ok(Self {
            id: PairId::new_v4(),
            base_currency,
            target_currency,
            markup,
            is_active: true,
            created_at: Timestamp::now(),
        })
    }

    /// Reconstructs a pair from stored parts without re-generating identity.
    #[must_use]
    pub fn from_parts(
        id: PairId,
        base_currency: CurrencyCode,
        target_currency: CurrencyCode,
        markup: Markup,
        is_active: bool,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            base_currency,
            target_currency,
            markup,
            is_active,
            created_at,
        }
    }

    /// Returns the pair ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PairId {
        self.id
    }

    /// Returns the base currency.
    #[inline]
    #[must_use]
    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    /// Returns the target currency.
    #[inline]
    #[must_use]
    pub fn target_currency(&self) -> &CurrencyCode {
        &self.target_currency
    }

    /// Returns the configured markup.
    #[inline]
    #[must_use]
    pub fn markup(&self) -> Markup {
        self.markup
    }

    /// Returns true if the pair participates in aggregation cycles.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns when the pair was configured.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Updates the markup. The only mutation a configured pair supports.
    pub fn set_markup(&mut self, markup: Markup) {
        self.markup = markup;
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Returns true if `code` is this pair's base or target.
    #[must_use]
    pub fn involves(&self, code: &CurrencyCode) -> bool {
        &self.base_currency == code || &self.target_currency == code
    }

    /// Returns true if `other` covers the same two currencies in either order.
    #[must_use]
    pub fn same_currencies(&self, base: &CurrencyCode, target: &CurrencyCode) -> bool {
        (&self.base_currency == base && &self.target_currency == target)
            || (&self.base_currency == target && &self.target_currency == base)
    }

    /// Returns the `BASE-TARGET` display symbol.
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}-{}", self.base_currency, self.target_currency)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (markup {})", self.symbol(), self.markup)
    }
}

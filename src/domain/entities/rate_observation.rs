//! # Rate Observation Entity
//!
//! One raw quote from one provider for one currency pair at one instant.
//! Observations are immutable once written and stored append-only.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{PairId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw rate quote as received from a single provider.
///
/// # Invariants
///
/// - `buy_rate` and `sell_rate` are strictly positive
/// - References a pair that was active at fetch time (enforced on commit)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateObservation {
    /// The pair this quote is for.
    currency_pair_id: PairId,
    /// Name of the source provider.
    provider: String,
    /// Quoted buy rate.
    buy_rate: Decimal,
    /// Quoted sell rate.
    sell_rate: Decimal,
    /// Provider-reported quote time.
    fetched_at: Timestamp,
}

impl RateObservation {
    /// Creates an observation with rate validation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonPositiveRate`] if either rate is zero
    /// or negative.
    pub fn new(
        currency_pair_id: PairId,
        provider: impl Into<String>,
        buy_rate: Decimal,
        sell_rate: Decimal,
        fetched_at: Timestamp,
    ) -> DomainResult<Self> {
        if buy_rate <= Decimal::ZERO {
            return Err(DomainError::non_positive_rate("buy_rate", buy_rate));
        }
        if sell_rate <= Decimal::ZERO {
            return Err(DomainError::non_positive_rate("sell_rate", sell_rate));
        }

        Ok(Self {
            currency_pair_id,
            provider: provider.into(),
            buy_rate,
            sell_rate,
            fetched_at,
        })
    }

    /// Returns the pair ID.
    #[inline]
    #[must_use]
    pub fn currency_pair_id(&self) -> PairId {
        self.currency_pair_id
    }

    /// Returns the source provider name.
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the quoted buy rate.
    #[inline]
    #[must_use]
    pub fn buy_rate(&self) -> Decimal {
        self.buy_rate
    }

    /// Returns the quoted sell rate.
    #[inline]
    #[must_use]
    pub fn sell_rate(&self) -> Decimal {
        self.sell_rate
    }

    /// Returns the provider-reported quote time.
    #[inline]
    #[must_use]
    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }
}

impl fmt::Display for RateObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RateObservation({} buy={} sell={} from {})",
            self.currency_pair_id, self.buy_rate, self.sell_rate, self.provider
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accepts_positive_rates() {
        let obs = RateObservation::new(
            PairId::new_v4(),
            "exchange_rate",
            dec!(18.45),
            dec!(18.45),
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(obs.buy_rate(), dec!(18.45));
        assert_eq!(obs.provider(), "exchange_rate");
    }

    #[test]
    fn rejects_zero_buy_rate() {
        let err = RateObservation::new(
            PairId::new_v4(),
            "fixer",
            Decimal::ZERO,
            dec!(1.0),
            Timestamp::now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DomainError::NonPositiveRate {
                field: "buy_rate",
                ..
            }
        ));
    }

    #[test]
    fn rejects_negative_sell_rate() {
        let err = RateObservation::new(
            PairId::new_v4(),
            "fixer",
            dec!(1.0),
            dec!(-0.5),
            Timestamp::now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DomainError::NonPositiveRate {
                field: "sell_rate",
                ..
            }
        ));
    }
}

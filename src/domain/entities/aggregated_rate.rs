//! # Aggregated Rate Entity
//!
//! The reconciled, markup-applied rate for one currency pair, computed once
//! per aggregation cycle, plus the [`DerivedRate`] synthesized at read time
//! for opposite-direction lookups.
//!
//! An aggregated row is immutable once written; the "current" rate for a
//! pair is the row with the latest `aggregated_at`. The markup snapshot on
//! the row never changes even if the pair's live markup is updated later.

use crate::domain::entities::currency_pair::CurrencyPair;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{CurrencyCode, Markup, PairId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How long an aggregated rate stays current.
const VALIDITY_HOURS: i64 = 1;

/// One reconciled buy/sell rate for a pair in one aggregation cycle.
///
/// # Invariants
///
/// - `final_buy_rate` and `final_sell_rate` are strictly positive
/// - `provider_count >= 1`
/// - `expires_at = aggregated_at + 1 hour`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedRate {
    /// The pair this row reconciles.
    currency_pair_id: PairId,
    /// Arithmetic mean of the cycle's observed buy rates.
    average_buy_rate: Decimal,
    /// Arithmetic mean of the cycle's observed sell rates.
    average_sell_rate: Decimal,
    /// `average_buy_rate * (1 + markup)`, rounded to 8 dp half-up.
    final_buy_rate: Decimal,
    /// `average_sell_rate * (1 - markup)`, rounded to 8 dp half-up.
    final_sell_rate: Decimal,
    /// Markup snapshot taken at aggregation time.
    markup: Markup,
    /// Number of distinct sources that contributed.
    provider_count: u32,
    /// When the aggregation ran.
    aggregated_at: Timestamp,
    /// When this row stops being current.
    expires_at: Timestamp,
}

impl AggregatedRate {
    /// Creates an aggregated row, deriving `expires_at` from `aggregated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonPositiveRate`] if either final rate is
    /// zero or negative.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        currency_pair_id: PairId,
        average_buy_rate: Decimal,
        average_sell_rate: Decimal,
        final_buy_rate: Decimal,
        final_sell_rate: Decimal,
        markup: Markup,
        provider_count: u32,
        aggregated_at: Timestamp,
    ) -> DomainResult<Self> {
        if final_buy_rate <= Decimal::ZERO {
            return Err(DomainError::non_positive_rate(
                "final_buy_rate",
                final_buy_rate,
            ));
        }
        if final_sell_rate <= Decimal::ZERO {
            return Err(DomainError::non_positive_rate(
                "final_sell_rate",
                final_sell_rate,
            ));
        }

        Ok(Self {
            currency_pair_id,
            average_buy_rate,
            average_sell_rate,
            final_buy_rate,
            final_sell_rate,
            markup,
            provider_count,
            aggregated_at,
            expires_at: aggregated_at.add_hours(VALIDITY_HOURS),
        })
    }

    /// Returns the pair ID.
    #[inline]
    #[must_use]
    pub fn currency_pair_id(&self) -> PairId {
        self.currency_pair_id
    }

    /// Returns the averaged buy rate before markup.
    #[inline]
    #[must_use]
    pub fn average_buy_rate(&self) -> Decimal {
        self.average_buy_rate
    }

    /// Returns the averaged sell rate before markup.
    #[inline]
    #[must_use]
    pub fn average_sell_rate(&self) -> Decimal {
        self.average_sell_rate
    }

    /// Returns the marked-up buy rate.
    #[inline]
    #[must_use]
    pub fn final_buy_rate(&self) -> Decimal {
        self.final_buy_rate
    }

    /// Returns the marked-down sell rate.
    #[inline]
    #[must_use]
    pub fn final_sell_rate(&self) -> Decimal {
        self.final_sell_rate
    }

    /// Returns the markup snapshot taken at aggregation time.
    #[inline]
    #[must_use]
    pub fn markup(&self) -> Markup {
        self.markup
    }

    /// Returns the number of distinct contributing sources.
    #[inline]
    #[must_use]
    pub fn provider_count(&self) -> u32 {
        self.provider_count
    }

    /// Returns when the aggregation ran.
    #[inline]
    #[must_use]
    pub fn aggregated_at(&self) -> Timestamp {
        self.aggregated_at
    }

    /// Returns when this row stops being current.
    #[inline]
    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Returns true if the row has passed its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Timestamp::now().is_after(&self.expires_at)
    }

    /// Derives the opposite-direction rate from this row.
    ///
    /// Bid and ask swap roles under inversion: the derived buy rate is the
    /// reciprocal of the stored *sell* rate and the derived sell rate the
    /// reciprocal of the stored *buy* rate, not a field-wise reciprocal.
    ///
    /// `pair` must be the pair this row belongs to; it supplies the
    /// currency codes to swap.
    #[must_use]
    pub fn invert(&self, pair: &CurrencyPair) -> DerivedRate {
        DerivedRate {
            base_currency: pair.target_currency().clone(),
            target_currency: pair.base_currency().clone(),
            final_buy_rate: Decimal::ONE / self.final_sell_rate,
            final_sell_rate: Decimal::ONE / self.final_buy_rate,
            source_pair_id: self.currency_pair_id,
            aggregated_at: self.aggregated_at,
            expires_at: self.expires_at,
        }
    }
}

impl fmt::Display for AggregatedRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AggregatedRate({} buy={} sell={} providers={})",
            self.currency_pair_id, self.final_buy_rate, self.final_sell_rate, self.provider_count
        )
    }
}

/// An opposite-direction rate computed from a stored [`AggregatedRate`].
///
/// Never persisted; synthesized at read time when a lookup requests the
/// direction that was not fetched. Always tagged `inverted = true` in its
/// serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedRate {
    /// Base currency after the swap (the stored pair's target).
    base_currency: CurrencyCode,
    /// Target currency after the swap (the stored pair's base).
    target_currency: CurrencyCode,
    /// Reciprocal of the stored final sell rate.
    final_buy_rate: Decimal,
    /// Reciprocal of the stored final buy rate.
    final_sell_rate: Decimal,
    /// The stored pair this rate was derived from.
    source_pair_id: PairId,
    /// Aggregation time of the source row.
    aggregated_at: Timestamp,
    /// Expiry of the source row.
    expires_at: Timestamp,
}

impl DerivedRate {
    /// Returns the base currency after the swap.
    #[inline]
    #[must_use]
    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    /// Returns the target currency after the swap.
    #[inline]
    #[must_use]
    pub fn target_currency(&self) -> &CurrencyCode {
        &self.target_currency
    }

    /// Returns the derived buy rate.
    #[inline]
    #[must_use]
    pub fn final_buy_rate(&self) -> Decimal {
        self.final_buy_rate
    }

    /// Returns the derived sell rate.
    #[inline]
    #[must_use]
    pub fn final_sell_rate(&self) -> Decimal {
        self.final_sell_rate
    }

    /// Returns the stored pair this rate was derived from.
    #[inline]
    #[must_use]
    pub fn source_pair_id(&self) -> PairId {
        self.source_pair_id
    }

    /// Returns the aggregation time of the source row.
    #[inline]
    #[must_use]
    pub fn aggregated_at(&self) -> Timestamp {
        self.aggregated_at
    }

    /// Returns the expiry of the source row.
    #[inline]
    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Always true; derived rates exist only for the unfetched direction.
    #[inline]
    #[must_use]
    pub fn inverted(&self) -> bool {
        true
    }
}

impl fmt::Display for DerivedRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DerivedRate({}-{} buy={} sell={} inverted)",
            self.base_currency, self.target_currency, self.final_buy_rate, self.final_sell_rate
        )
    }
}

//! # Rate Aggregator
//!
//! Combines per-provider observations for one pair into a single
//! aggregated rate with the pair's markup applied.
//!
//! All arithmetic is decimal; binary floating point never touches a rate.
//! Averages are stored at full precision; only the customer-facing final
//! rates are rounded, to 8 decimal places with half-up rounding.

use crate::domain::entities::{AggregatedRate, CurrencyPair, RateObservation};
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Decimal places kept on customer-facing rates.
pub const RATE_SCALE: u32 = 8;

/// Stateless aggregation service.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateAggregator;

impl RateAggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Rounds a customer-facing rate to [`RATE_SCALE`] places, half away
    /// from zero.
    #[must_use]
    pub fn round_rate(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Aggregates observations for `pair` into one rate.
    ///
    /// Returns `Ok(None)` when there is nothing to aggregate; the pair is
    /// skipped for this cycle and keeps its previous rate.
    ///
    /// # Errors
    ///
    /// Propagates domain validation if a final rate comes out non-positive,
    /// which can only happen with a markup of exactly 1.
    pub fn aggregate(
        &self,
        pair: &CurrencyPair,
        observations: &[RateObservation],
    ) -> DomainResult<Option<AggregatedRate>> {
        if observations.is_empty() {
            warn!(pair = %pair.symbol(), "no observations this cycle, keeping previous rate");
            return Ok(None);
        }

        let count = Decimal::from(observations.len());
        let buy_sum: Decimal = observations.iter().map(RateObservation::buy_rate).sum();
        let sell_sum: Decimal = observations.iter().map(RateObservation::sell_rate).sum();
        let average_buy_rate = buy_sum / count;
        let average_sell_rate = sell_sum / count;

        let markup = pair.markup();
        let final_buy_rate = Self::round_rate(average_buy_rate * markup.buy_multiplier());
        let final_sell_rate = Self::round_rate(average_sell_rate * markup.sell_multiplier());

        let provider_count = observations
            .iter()
            .map(RateObservation::provider)
            .collect::<BTreeSet<_>>()
            .len() as u32;

        debug!(
            pair = %pair.symbol(),
            providers = provider_count,
            %final_buy_rate,
            %final_sell_rate,
            "aggregated cycle rates"
        );

        AggregatedRate::new(
            pair.id(),
            average_buy_rate,
            average_sell_rate,
            final_buy_rate,
            final_sell_rate,
            markup,
            provider_count,
            Timestamp::now(),
        )
        .map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{CurrencyCode, Markup};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn pair_with_markup(markup: Decimal) -> CurrencyPair {
        CurrencyPair::new(
            CurrencyCode::new("USD").unwrap(),
            CurrencyCode::new("ZAR").unwrap(),
            Markup::new(markup).unwrap(),
        )
        .unwrap()
    }

    fn observation(pair: &CurrencyPair, provider: &str, rate: Decimal) -> RateObservation {
        RateObservation::new(pair.id(), provider, rate, rate, Timestamp::now()).unwrap()
    }

    #[test]
    fn three_providers_with_ten_percent_markup() {
        let pair = pair_with_markup(dec!(0.10));
        let observations = vec![
            observation(&pair, "exchange_rate", dec!(1.00)),
            observation(&pair, "fixer", dec!(1.02)),
            observation(&pair, "currency_layer", dec!(0.98)),
        ];

        let rate = RateAggregator::new()
            .aggregate(&pair, &observations)
            .unwrap()
            .unwrap();

        assert_eq!(rate.average_buy_rate(), dec!(1.00));
        assert_eq!(rate.final_buy_rate(), dec!(1.10));
        assert_eq!(rate.final_sell_rate(), dec!(0.90));
        assert_eq!(rate.provider_count(), 3);
    }

    #[test]
    fn empty_observations_skip_the_pair() {
        let pair = pair_with_markup(dec!(0.10));
        let rate = RateAggregator::new().aggregate(&pair, &[]).unwrap();
        assert!(rate.is_none());
    }

    #[test]
    fn duplicate_providers_count_once() {
        let pair = pair_with_markup(dec!(0.10));
        let observations = vec![
            observation(&pair, "polygon", dec!(1.00)),
            observation(&pair, "polygon", dec!(1.10)),
        ];

        let rate = RateAggregator::new()
            .aggregate(&pair, &observations)
            .unwrap()
            .unwrap();
        assert_eq!(rate.provider_count(), 1);
    }

    #[test]
    fn averages_keep_full_precision() {
        // 1/3 is not representable at 8 places; the average must not be
        // pre-rounded before markup is applied.
        let pair = pair_with_markup(Decimal::ZERO);
        let observations = vec![
            observation(&pair, "a", dec!(1)),
            observation(&pair, "b", dec!(1)),
            observation(&pair, "c", dec!(2)),
        ];

        let rate = RateAggregator::new()
            .aggregate(&pair, &observations)
            .unwrap()
            .unwrap();
        assert!(rate.average_buy_rate().to_string().len() > 10);
        assert_eq!(rate.final_buy_rate(), dec!(1.33333333));
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        let pair = pair_with_markup(Decimal::ZERO);
        let observations = vec![observation(&pair, "a", dec!(0.123456785))];

        let rate = RateAggregator::new()
            .aggregate(&pair, &observations)
            .unwrap()
            .unwrap();
        assert_eq!(rate.final_buy_rate(), dec!(0.12345679));
    }

    proptest! {
        #[test]
        fn buy_above_sell_for_any_markup(
            rate_cents in 1u32..10_000_000,
            markup_bps in 0u32..10_000,
        ) {
            let rate = Decimal::new(i64::from(rate_cents), 4);
            let markup = Decimal::new(i64::from(markup_bps), 4);
            let pair = pair_with_markup(markup);
            let observations = vec![observation(&pair, "exchange_rate", rate)];

            let aggregated = RateAggregator::new()
                .aggregate(&pair, &observations)
                .unwrap()
                .unwrap();

            let rounded = RateAggregator::round_rate(rate);
            prop_assert!(aggregated.final_buy_rate() >= aggregated.final_sell_rate());
            prop_assert!(aggregated.final_buy_rate() >= rounded);
            prop_assert!(aggregated.final_sell_rate() <= rounded);
            if markup_bps == 0 {
                prop_assert_eq!(aggregated.final_buy_rate(), rounded);
                prop_assert_eq!(aggregated.final_sell_rate(), rounded);
            }
        }
    }
}

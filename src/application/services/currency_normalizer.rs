//! # Currency Normalizer
//!
//! Direction-agnostic rate lookup for a single currency.
//!
//! A pair is stored once, in one direction. When a caller asks for a
//! currency that appears on the target side of a pair, the stored
//! aggregate is inverted on the fly so the answer is always quoted with
//! the requested currency as base. Inversion swaps the bid/ask roles:
//! the derived buy rate is the reciprocal of the stored sell rate and
//! vice versa. Derived rates are never persisted.

use crate::application::error::EngineResult;
use crate::domain::entities::{AggregatedRate, CurrencyPair, DerivedRate};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{CurrencyCode, Timestamp};
use crate::infrastructure::persistence::RateStore;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// One rate quoted with the requested currency as base.
#[derive(Debug, Clone)]
pub enum CurrencyRate {
    /// The pair is stored in the requested direction.
    Stored {
        /// The persisted aggregate.
        rate: AggregatedRate,
        /// The pair it belongs to.
        pair: CurrencyPair,
    },
    /// The pair is stored in the opposite direction; this is its
    /// on-the-fly inversion.
    Derived(DerivedRate),
}

impl CurrencyRate {
    /// Returns the quoted base currency.
    #[must_use]
    pub fn base_currency(&self) -> &CurrencyCode {
        match self {
            Self::Stored { pair, .. } => pair.base_currency(),
            Self::Derived(derived) => derived.base_currency(),
        }
    }

    /// Returns the quoted target currency.
    #[must_use]
    pub fn target_currency(&self) -> &CurrencyCode {
        match self {
            Self::Stored { pair, .. } => pair.target_currency(),
            Self::Derived(derived) => derived.target_currency(),
        }
    }

    /// Returns the customer buy rate in the quoted direction.
    #[must_use]
    pub fn final_buy_rate(&self) -> Decimal {
        match self {
            Self::Stored { rate, .. } => rate.final_buy_rate(),
            Self::Derived(derived) => derived.final_buy_rate(),
        }
    }

    /// Returns the customer sell rate in the quoted direction.
    #[must_use]
    pub fn final_sell_rate(&self) -> Decimal {
        match self {
            Self::Stored { rate, .. } => rate.final_sell_rate(),
            Self::Derived(derived) => derived.final_sell_rate(),
        }
    }

    /// Returns when the underlying aggregate was produced.
    #[must_use]
    pub fn aggregated_at(&self) -> Timestamp {
        match self {
            Self::Stored { rate, .. } => rate.aggregated_at(),
            Self::Derived(derived) => derived.aggregated_at(),
        }
    }

    /// Returns true if this rate was inverted rather than stored.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Derived(_))
    }
}

/// All current rates for one currency.
#[derive(Debug, Clone)]
pub struct CurrencyRates {
    /// The requested currency, always the base of every rate.
    pub currency: CurrencyCode,
    /// Rates against every counter-currency with a current aggregate.
    pub rates: Vec<CurrencyRate>,
}

impl CurrencyRates {
    /// Returns the number of counter-currencies quoted.
    #[must_use]
    pub fn count(&self) -> usize {
        self.rates.len()
    }
}

/// Direction-agnostic lookup service over the rate store.
#[derive(Debug, Clone)]
pub struct CurrencyNormalizer {
    store: Arc<dyn RateStore>,
}

impl CurrencyNormalizer {
    /// Creates a normalizer over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self { store }
    }

    /// Validates a raw code: shape first, then membership in the
    /// configured pairs.
    ///
    /// # Errors
    ///
    /// Shape violations surface as the code-shape domain errors; a
    /// well-formed code no pair uses surfaces as
    /// [`DomainError::UnknownCurrency`].
    pub async fn validate_code(&self, raw: &str) -> EngineResult<CurrencyCode> {
        let code = CurrencyCode::new(raw)?;
        let known = self.store.distinct_currency_codes().await?;
        if !known.contains(&code) {
            return Err(DomainError::UnknownCurrency {
                code: code.as_str().to_string(),
            }
            .into());
        }
        Ok(code)
    }

    /// Returns every current rate for `raw`, quoted with it as base.
    ///
    /// # Errors
    ///
    /// Code validation errors, or store failures.
    pub async fn latest_for_currency(&self, raw: &str) -> EngineResult<CurrencyRates> {
        let code = self.validate_code(raw).await?;
        let rates = self.rates_for(&code).await?;
        debug!(currency = %code, count = rates.len(), "resolved rates for currency");
        Ok(CurrencyRates {
            currency: code,
            rates,
        })
    }

    /// Returns current rates for every currency any pair uses.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn latest_for_all(&self) -> EngineResult<BTreeMap<CurrencyCode, CurrencyRates>> {
        let mut all = BTreeMap::new();
        for code in self.store.distinct_currency_codes().await? {
            let rates = self.rates_for(&code).await?;
            all.insert(
                code.clone(),
                CurrencyRates {
                    currency: code,
                    rates,
                },
            );
        }
        Ok(all)
    }

    async fn rates_for(&self, code: &CurrencyCode) -> EngineResult<Vec<CurrencyRate>> {
        let mut rates = Vec::new();
        for (rate, pair) in self.store.latest_aggregated_for_base(code).await? {
            rates.push(CurrencyRate::Stored { rate, pair });
        }
        for (rate, pair) in self.store.latest_aggregated_for_target(code).await? {
            rates.push(CurrencyRate::Derived(rate.invert(&pair)));
        }
        Ok(rates)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Markup;
    use crate::infrastructure::persistence::{CycleBatch, InMemoryRateStore};
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    async fn seeded_store() -> (Arc<InMemoryRateStore>, CurrencyPair) {
        let store = Arc::new(InMemoryRateStore::new());
        let pair = CurrencyPair::new(
            code("USD"),
            code("ZAR"),
            Markup::new(dec!(0.10)).unwrap(),
        )
        .unwrap();
        store.add_pair(pair.clone()).await.unwrap();

        let aggregate = AggregatedRate::new(
            pair.id(),
            dec!(2.00),
            dec!(4.00),
            dec!(2.00),
            dec!(4.00),
            Markup::zero(),
            2,
            Timestamp::now(),
        )
        .unwrap();
        store
            .commit_cycle(CycleBatch {
                observations: vec![],
                aggregated: vec![aggregate],
            })
            .await
            .unwrap();
        (store, pair)
    }

    #[tokio::test]
    async fn base_side_lookup_returns_stored_rate() {
        let (store, _) = seeded_store().await;
        let normalizer = CurrencyNormalizer::new(store);

        let rates = normalizer.latest_for_currency("USD").await.unwrap();
        assert_eq!(rates.count(), 1);
        assert!(!rates.rates[0].is_derived());
        assert_eq!(rates.rates[0].final_buy_rate(), dec!(2.00));
    }

    #[tokio::test]
    async fn target_side_lookup_inverts_and_swaps_roles() {
        let (store, _) = seeded_store().await;
        let normalizer = CurrencyNormalizer::new(store);

        let rates = normalizer.latest_for_currency("ZAR").await.unwrap();
        assert_eq!(rates.count(), 1);
        let rate = &rates.rates[0];
        assert!(rate.is_derived());
        assert_eq!(rate.base_currency(), &code("ZAR"));
        assert_eq!(rate.target_currency(), &code("USD"));
        // Stored buy 2, sell 4: derived buy = 1/4, derived sell = 1/2.
        assert_eq!(rate.final_buy_rate(), dec!(0.25));
        assert_eq!(rate.final_sell_rate(), dec!(0.5));
    }

    #[tokio::test]
    async fn malformed_code_rejected_before_store_lookup() {
        let (store, _) = seeded_store().await;
        let normalizer = CurrencyNormalizer::new(store);

        let error = normalizer.latest_for_currency("usd").await.unwrap_err();
        assert!(error.to_string().contains("upper case"));
    }

    #[tokio::test]
    async fn unknown_code_rejected_by_membership() {
        let (store, _) = seeded_store().await;
        let normalizer = CurrencyNormalizer::new(store);

        let error = normalizer.latest_for_currency("JPY").await.unwrap_err();
        assert!(error.to_string().contains("does not appear"));
    }

    #[tokio::test]
    async fn latest_for_all_covers_both_sides() {
        let (store, _) = seeded_store().await;
        let normalizer = CurrencyNormalizer::new(store);

        let all = normalizer.latest_for_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&code("USD")].count(), 1);
        assert!(all[&code("ZAR")].rates[0].is_derived());
    }
}

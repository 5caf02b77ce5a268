//! # In-Memory Rate Store
//!
//! In-memory implementation of [`RateStore`].
//!
//! All tables live behind one `RwLock`, which is what makes
//! [`RateStore::commit_cycle`] atomic: the batch is validated and applied
//! under a single write guard, so readers never observe a half-written
//! cycle. Suitable for tests and single-process deployments.

use crate::domain::entities::{AggregatedRate, CurrencyPair, RateObservation};
use crate::domain::value_objects::{CurrencyCode, Markup, PairId};
use crate::infrastructure::persistence::traits::{
    CycleBatch, HistoricalQuery, RateStore, SortOrder, StoreError, StoreResult,
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// All tables of the store, guarded together.
#[derive(Debug, Default)]
struct Tables {
    pairs: HashMap<PairId, CurrencyPair>,
    observations: Vec<RateObservation>,
    aggregates: Vec<AggregatedRate>,
}

impl Tables {
    /// Returns the active pair ids a batch may reference.
    fn active_pair_ids(&self) -> BTreeSet<PairId> {
        self.pairs
            .values()
            .filter(|p| p.is_active())
            .map(CurrencyPair::id)
            .collect()
    }
}

/// In-memory implementation of [`RateStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted observations.
    pub async fn observation_count(&self) -> usize {
        self.tables.read().await.observations.len()
    }

    /// Returns the number of persisted aggregates.
    pub async fn aggregate_count(&self) -> usize {
        self.tables.read().await.aggregates.len()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        *tables = Tables::default();
    }

    /// Latest aggregate for one pair within an already-held guard.
    fn latest_in(tables: &Tables, id: PairId) -> Option<AggregatedRate> {
        tables
            .aggregates
            .iter()
            .filter(|a| a.currency_pair_id() == id)
            .max_by_key(|a| a.aggregated_at().inner())
            .cloned()
    }

    /// Latest aggregate per active pair selected by `matches`.
    async fn latest_matching(
        &self,
        matches: impl Fn(&CurrencyPair) -> bool,
    ) -> Vec<(AggregatedRate, CurrencyPair)> {
        let tables = self.tables.read().await;
        tables
            .pairs
            .values()
            .filter(|p| p.is_active() && matches(p))
            .filter_map(|p| Self::latest_in(&tables, p.id()).map(|a| (a, p.clone())))
            .collect()
    }
}

#[async_trait]
impl RateStore for InMemoryRateStore {
    async fn add_pair(&self, pair: CurrencyPair) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let clash = tables
            .pairs
            .values()
            .any(|existing| existing.same_currencies(pair.base_currency(), pair.target_currency()));
        if clash {
            return Err(StoreError::duplicate_pair(pair.symbol()));
        }
        tables.pairs.insert(pair.id(), pair);
        Ok(())
    }

    async fn get_pair(&self, id: PairId) -> StoreResult<Option<CurrencyPair>> {
        let tables = self.tables.read().await;
        Ok(tables.pairs.get(&id).cloned())
    }

    async fn list_active_pairs(&self) -> StoreResult<Vec<CurrencyPair>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pairs
            .values()
            .filter(|p| p.is_active())
            .cloned()
            .collect())
    }

    async fn update_markup(&self, id: PairId, markup: Markup) -> StoreResult<CurrencyPair> {
        let mut tables = self.tables.write().await;
        let pair = tables
            .pairs
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("CurrencyPair", id.to_string()))?;
        pair.set_markup(markup);
        Ok(pair.clone())
    }

    async fn commit_cycle(&self, batch: CycleBatch) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let active = tables.active_pair_ids();

        for observation in &batch.observations {
            if !active.contains(&observation.currency_pair_id()) {
                return Err(StoreError::invalid_batch(format!(
                    "observation from '{}' references unknown or inactive pair {}",
                    observation.provider(),
                    observation.currency_pair_id()
                )));
            }
        }
        for aggregate in &batch.aggregated {
            if !active.contains(&aggregate.currency_pair_id()) {
                return Err(StoreError::invalid_batch(format!(
                    "aggregate references unknown or inactive pair {}",
                    aggregate.currency_pair_id()
                )));
            }
        }

        tables.observations.extend(batch.observations);
        tables.aggregates.extend(batch.aggregated);
        Ok(())
    }

    async fn latest_aggregated_for(&self, id: PairId) -> StoreResult<Option<AggregatedRate>> {
        let tables = self.tables.read().await;
        Ok(Self::latest_in(&tables, id))
    }

    async fn latest_aggregated_for_base(
        &self,
        code: &CurrencyCode,
    ) -> StoreResult<Vec<(AggregatedRate, CurrencyPair)>> {
        Ok(self.latest_matching(|p| p.base_currency() == code).await)
    }

    async fn latest_aggregated_for_target(
        &self,
        code: &CurrencyCode,
    ) -> StoreResult<Vec<(AggregatedRate, CurrencyPair)>> {
        Ok(self.latest_matching(|p| p.target_currency() == code).await)
    }

    async fn distinct_currency_codes(&self) -> StoreResult<BTreeSet<CurrencyCode>> {
        let tables = self.tables.read().await;
        let mut codes = BTreeSet::new();
        for pair in tables.pairs.values() {
            codes.insert(pair.base_currency().clone());
            codes.insert(pair.target_currency().clone());
        }
        Ok(codes)
    }

    async fn historical(&self, query: HistoricalQuery) -> StoreResult<Vec<AggregatedRate>> {
        let tables = self.tables.read().await;
        let pair_id = tables
            .pairs
            .values()
            .find(|p| {
                p.base_currency() == &query.base_currency
                    && p.target_currency() == &query.target_currency
            })
            .map(CurrencyPair::id)
            .ok_or_else(|| {
                StoreError::not_found(
                    "CurrencyPair",
                    format!("{}-{}", query.base_currency, query.target_currency),
                )
            })?;

        let mut rows: Vec<AggregatedRate> = tables
            .aggregates
            .iter()
            .filter(|a| a.currency_pair_id() == pair_id)
            .filter(|a| {
                query
                    .from
                    .is_none_or(|from| !a.aggregated_at().is_before(&from))
            })
            .filter(|a| query.to.is_none_or(|to| !a.aggregated_at().is_after(&to)))
            .cloned()
            .collect();

        rows.sort_by_key(|a| a.aggregated_at().inner());
        if query.order == SortOrder::Descending {
            rows.reverse();
        }
        rows.truncate(query.effective_limit());
        Ok(rows)
    }
}

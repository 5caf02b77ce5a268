//! # Rate Store Trait
//!
//! Port definition for rate persistence.
//!
//! The engine never talks to a storage technology directly; it persists
//! pairs, observations, and aggregates through [`RateStore`]. Aggregation
//! cycles commit through [`RateStore::commit_cycle`], which is
//! all-or-nothing: a cycle either lands completely or not at all.
//!
//! # Examples
//!
//! ```ignore
//! use fx_rates_engine::infrastructure::persistence::traits::RateStore;
//!
//! async fn active_pair_count(store: &impl RateStore) -> usize {
//!     store.list_active_pairs().await.unwrap().len()
//! }
//! ```

use crate::domain::entities::{AggregatedRate, CurrencyPair, RateObservation};
use crate::domain::value_objects::{CurrencyCode, Markup, PairId, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Default page size for historical queries.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Hard cap on historical query page size.
pub const MAX_HISTORY_LIMIT: usize = 1000;

/// Error type for rate store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found.
    #[error("not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// A pair for these currencies already exists, in either direction.
    #[error("duplicate pair: {symbol} already exists (order-insensitive)")]
    DuplicatePair {
        /// Pair symbol such as `USD-ZAR`.
        symbol: String,
    },

    /// A cycle batch references a pair the store does not hold active.
    #[error("invalid batch: {reason}")]
    InvalidBatch {
        /// What made the batch unacceptable.
        reason: String,
    },

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a duplicate pair error.
    #[must_use]
    pub fn duplicate_pair(symbol: impl Into<String>) -> Self {
        Self::DuplicatePair {
            symbol: symbol.into(),
        }
    }

    /// Creates an invalid batch error.
    #[must_use]
    pub fn invalid_batch(reason: impl Into<String>) -> Self {
        Self::InvalidBatch {
            reason: reason.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate pair error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicatePair { .. })
    }
}

/// Result type for rate store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Everything one aggregation cycle produced, committed atomically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleBatch {
    /// Raw per-provider observations.
    pub observations: Vec<RateObservation>,
    /// Aggregated rates derived from those observations.
    pub aggregated: Vec<AggregatedRate>,
}

impl CycleBatch {
    /// Returns true if the batch carries nothing to persist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty() && self.aggregated.is_empty()
    }
}

/// Sort direction for historical queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

/// Filter for historical aggregated rates.
#[derive(Debug, Clone)]
pub struct HistoricalQuery {
    /// Base currency of the pair.
    pub base_currency: CurrencyCode,
    /// Target currency of the pair.
    pub target_currency: CurrencyCode,
    /// Inclusive lower bound on aggregation time.
    pub from: Option<Timestamp>,
    /// Inclusive upper bound on aggregation time.
    pub to: Option<Timestamp>,
    /// Requested page size; clamped to [`MAX_HISTORY_LIMIT`].
    pub limit: usize,
    /// Sort direction; newest first by default.
    pub order: SortOrder,
}

impl HistoricalQuery {
    /// Builds a query for one pair with the default window and limit.
    #[must_use]
    pub fn for_pair(base_currency: CurrencyCode, target_currency: CurrencyCode) -> Self {
        Self {
            base_currency,
            target_currency,
            from: None,
            to: None,
            limit: DEFAULT_HISTORY_LIMIT,
            order: SortOrder::Descending,
        }
    }

    /// Sets the inclusive time window.
    #[must_use]
    pub fn between(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Sets the requested page size.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the sort direction.
    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Returns the limit the store must actually apply.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_HISTORY_LIMIT
        } else {
            self.limit.min(MAX_HISTORY_LIMIT)
        }
    }
}

/// Port for rate persistence.
///
/// # Uniqueness
///
/// Currency pairs are unique order-insensitively: once `USD-ZAR` exists,
/// `add_pair` rejects both `USD-ZAR` and `ZAR-USD`. Lookups for the
/// reverse direction are served by inversion at the application layer,
/// never by a second row.
#[async_trait]
pub trait RateStore: Send + Sync + fmt::Debug {
    /// Adds a currency pair.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicatePair` if a pair for the same two
    /// currencies exists in either direction.
    async fn add_pair(&self, pair: CurrencyPair) -> StoreResult<()>;

    /// Gets a pair by id. Returns `None` if it does not exist.
    async fn get_pair(&self, id: PairId) -> StoreResult<Option<CurrencyPair>>;

    /// Lists pairs that participate in aggregation cycles.
    async fn list_active_pairs(&self) -> StoreResult<Vec<CurrencyPair>>;

    /// Replaces a pair's markup and returns the updated pair.
    ///
    /// Already-persisted aggregates keep the markup they were computed
    /// with; only future cycles see the new value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the pair does not exist.
    async fn update_markup(&self, id: PairId, markup: Markup) -> StoreResult<CurrencyPair>;

    /// Persists one cycle's output atomically.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidBatch` if any observation or aggregate
    /// references a pair the store does not hold active; nothing from the
    /// batch is persisted in that case.
    async fn commit_cycle(&self, batch: CycleBatch) -> StoreResult<()>;

    /// Returns the most recent aggregate for one pair, if any.
    async fn latest_aggregated_for(&self, id: PairId) -> StoreResult<Option<AggregatedRate>>;

    /// Returns the latest aggregate per active pair whose base currency
    /// matches `code`.
    async fn latest_aggregated_for_base(
        &self,
        code: &CurrencyCode,
    ) -> StoreResult<Vec<(AggregatedRate, CurrencyPair)>>;

    /// Returns the latest aggregate per active pair whose target currency
    /// matches `code`.
    async fn latest_aggregated_for_target(
        &self,
        code: &CurrencyCode,
    ) -> StoreResult<Vec<(AggregatedRate, CurrencyPair)>>;

    /// Returns every currency code appearing in any pair, active or not.
    async fn distinct_currency_codes(&self) -> StoreResult<BTreeSet<CurrencyCode>>;

    /// Returns historical aggregates for one pair, filtered and sorted
    /// per the query, capped at [`HistoricalQuery::effective_limit`].
    async fn historical(&self, query: HistoricalQuery) -> StoreResult<Vec<AggregatedRate>>;
}

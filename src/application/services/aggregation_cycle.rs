//! # Aggregation Cycle
//!
//! Orchestrates one end-to-end refresh: list active pairs, query every
//! configured source, aggregate per pair, and commit the whole cycle
//! atomically.
//!
//! A source that fails or a pair a source cannot quote never aborts the
//! cycle; the failure is logged and counted, and aggregation proceeds
//! with whatever arrived. Only a store failure fails the cycle, because
//! a half-persisted cycle would be worse than a stale one.

use crate::application::error::EngineResult;
use crate::application::services::rate_aggregator::RateAggregator;
use crate::application::services::rate_fetcher::{ProviderPayload, RateFetcher};
use crate::domain::entities::{AggregatedRate, CurrencyPair, RateObservation};
use crate::domain::value_objects::PairId;
use crate::infrastructure::persistence::{CycleBatch, RateStore};
use crate::infrastructure::providers::resilience::ResilientInvoker;
use crate::infrastructure::providers::traits::{ProviderHealth, RateRequest, RequestShape};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// One configured rate source: a named fetcher pass over one or more
/// clients, tried in fan-out order.
#[derive(Debug)]
pub struct RateSource {
    name: String,
    shape: RequestShape,
    fetcher: RateFetcher,
}

impl RateSource {
    /// Creates a source backed by a single resilient client.
    #[must_use]
    pub fn new(invoker: Arc<ResilientInvoker>) -> Self {
        let name = invoker.provider_name().to_string();
        let shape = invoker.client().request_shape();
        Self {
            name,
            shape,
            fetcher: RateFetcher::new(vec![invoker]),
        }
    }

    /// Creates a source that races several clients and keeps the first
    /// valid payload. The shape of the first client decides how the
    /// source is queried.
    ///
    /// Returns `None` for an empty invoker list.
    #[must_use]
    pub fn with_fallbacks(name: impl Into<String>, invokers: Vec<Arc<ResilientInvoker>>) -> Option<Self> {
        let shape = invokers.first()?.client().request_shape();
        Some(Self {
            name: name.into(),
            shape,
            fetcher: RateFetcher::new(invokers),
        })
    }

    /// Returns the source name used in observations and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how this source is queried.
    #[must_use]
    pub fn shape(&self) -> RequestShape {
        self.shape
    }

    /// Probes every client behind this source, named per provider.
    pub async fn health_check(&self) -> Vec<(&'static str, ProviderHealth)> {
        let mut results = Vec::new();
        for invoker in self.fetcher.invokers() {
            let health = invoker.client().health_check().await;
            results.push((invoker.provider_name(), health));
        }
        results
    }
}

/// Counters for one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Active pairs at the start of the cycle.
    pub pairs_total: usize,
    /// Observations committed.
    pub observations: usize,
    /// Aggregates committed.
    pub aggregates: usize,
    /// Source queries that produced nothing.
    pub fetch_failures: usize,
    /// Pairs with no observations this cycle.
    pub pairs_skipped: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pairs, {} observations, {} aggregates, {} fetch failures, {} skipped",
            self.pairs_total,
            self.observations,
            self.aggregates,
            self.fetch_failures,
            self.pairs_skipped
        )
    }
}

/// Runs aggregation cycles against a store and a set of sources.
#[derive(Debug)]
pub struct AggregationCycle {
    store: Arc<dyn RateStore>,
    sources: Vec<RateSource>,
    aggregator: RateAggregator,
}

impl AggregationCycle {
    /// Creates a cycle runner.
    #[must_use]
    pub fn new(store: Arc<dyn RateStore>, sources: Vec<RateSource>) -> Self {
        Self {
            store,
            sources,
            aggregator: RateAggregator::new(),
        }
    }

    /// Returns the configured sources.
    #[must_use]
    pub fn sources(&self) -> &[RateSource] {
        &self.sources
    }

    /// Runs one cycle.
    ///
    /// # Errors
    ///
    /// Store failures only; source- and pair-level problems are absorbed
    /// into the report.
    pub async fn run(&self) -> EngineResult<CycleReport> {
        let pairs = self.store.list_active_pairs().await?;
        let mut report = CycleReport {
            pairs_total: pairs.len(),
            ..CycleReport::default()
        };
        if pairs.is_empty() {
            info!("no active pairs, nothing to aggregate");
            return Ok(report);
        }

        let mut observations: Vec<RateObservation> = Vec::new();
        for source in &self.sources {
            let collected = match source.shape() {
                RequestShape::PerBase => self.query_per_base(source, &pairs, &mut report).await,
                RequestShape::PerPair => self.query_per_pair(source, &pairs, &mut report).await,
            };
            observations.extend(collected);
        }

        let mut by_pair: HashMap<PairId, Vec<RateObservation>> = HashMap::new();
        for observation in &observations {
            by_pair
                .entry(observation.currency_pair_id())
                .or_default()
                .push(observation.clone());
        }

        let mut aggregated: Vec<AggregatedRate> = Vec::new();
        for pair in &pairs {
            let pair_observations = by_pair.remove(&pair.id()).unwrap_or_default();
            match self.aggregator.aggregate(pair, &pair_observations) {
                Ok(Some(rate)) => aggregated.push(rate),
                Ok(None) => report.pairs_skipped += 1,
                Err(error) => {
                    warn!(pair = %pair.symbol(), %error, "aggregation rejected, skipping pair");
                    report.pairs_skipped += 1;
                }
            }
        }

        report.observations = observations.len();
        report.aggregates = aggregated.len();

        let batch = CycleBatch {
            observations,
            aggregated,
        };
        if batch.is_empty() {
            warn!(%report, "cycle produced nothing to commit");
            return Ok(report);
        }

        self.store.commit_cycle(batch).await?;
        info!(%report, "aggregation cycle committed");
        Ok(report)
    }

    /// Queries a map-shaped source once per distinct base currency.
    async fn query_per_base(
        &self,
        source: &RateSource,
        pairs: &[CurrencyPair],
        report: &mut CycleReport,
    ) -> Vec<RateObservation> {
        let mut by_base: BTreeMap<&str, Vec<&CurrencyPair>> = BTreeMap::new();
        for pair in pairs {
            by_base
                .entry(pair.base_currency().as_str())
                .or_default()
                .push(pair);
        }

        let mut observations = Vec::new();
        for (base, group) in by_base {
            match source
                .fetcher
                .fetch_first_valid(&RateRequest::for_base(base))
                .await
            {
                Ok(payload) => {
                    for pair in group {
                        self.observation_from(source, pair, &payload, &mut observations);
                    }
                }
                Err(error) => {
                    warn!(source = source.name(), base, %error, "source query failed");
                    report.fetch_failures += 1;
                }
            }
        }
        observations
    }

    /// Queries a pair-shaped source once per pair.
    async fn query_per_pair(
        &self,
        source: &RateSource,
        pairs: &[CurrencyPair],
        report: &mut CycleReport,
    ) -> Vec<RateObservation> {
        let mut observations = Vec::new();
        for pair in pairs {
            let request = RateRequest::for_pair(
                pair.base_currency().as_str(),
                pair.target_currency().as_str(),
            );
            match source.fetcher.fetch_first_valid(&request).await {
                Ok(payload) => {
                    self.observation_from(source, pair, &payload, &mut observations);
                }
                Err(error) => {
                    warn!(source = source.name(), pair = %pair.symbol(), %error, "source query failed");
                    report.fetch_failures += 1;
                }
            }
        }
        observations
    }

    /// Builds an observation for one pair from a winning payload, if the
    /// payload quotes the pair's target.
    fn observation_from(
        &self,
        source: &RateSource,
        pair: &CurrencyPair,
        payload: &ProviderPayload,
        observations: &mut Vec<RateObservation>,
    ) {
        let Some(rate) = payload.data.rate_for(pair.target_currency().as_str()) else {
            warn!(
                source = source.name(),
                pair = %pair.symbol(),
                "payload does not quote the pair's target"
            );
            return;
        };

        match RateObservation::new(
            pair.id(),
            source.name(),
            rate,
            rate,
            payload.data.last_update_at,
        ) {
            Ok(observation) => observations.push(observation),
            Err(error) => {
                warn!(source = source.name(), pair = %pair.symbol(), %error, "rejecting quoted rate");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{CurrencyCode, Markup, Timestamp};
    use crate::infrastructure::persistence::InMemoryRateStore;
    use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
    use crate::infrastructure::providers::traits::{ProviderClient, ProviderHealth, RateData};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[derive(Debug)]
    struct MapClient {
        name: &'static str,
        rate: Decimal,
    }

    #[async_trait]
    impl ProviderClient for MapClient {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, request: &RateRequest) -> ProviderResult<RateData> {
            Ok(RateData {
                base_code: request.base_currency().into(),
                conversion_rates: std::collections::HashMap::from([
                    ("ZAR".to_string(), self.rate),
                    ("GBP".to_string(), self.rate * dec!(2)),
                ]),
                last_update_at: Timestamp::now(),
            })
        }

        async fn health_check(&self) -> ProviderHealth {
            ProviderHealth::reachable("ok")
        }
    }

    #[derive(Debug)]
    struct PairClient {
        rate: Decimal,
    }

    #[async_trait]
    impl ProviderClient for PairClient {
        fn name(&self) -> &'static str {
            "polygon"
        }

        fn request_shape(&self) -> RequestShape {
            RequestShape::PerPair
        }

        async fn fetch(&self, request: &RateRequest) -> ProviderResult<RateData> {
            let target = request.target_currency().ok_or_else(|| {
                ProviderError::invalid_request(self.name(), "target required")
            })?;
            Ok(RateData {
                base_code: request.base_currency().into(),
                conversion_rates: std::collections::HashMap::from([(
                    target.to_string(),
                    self.rate,
                )]),
                last_update_at: Timestamp::now(),
            })
        }

        async fn health_check(&self) -> ProviderHealth {
            ProviderHealth::reachable("ok")
        }
    }

    #[derive(Debug)]
    struct DownClient;

    #[async_trait]
    impl ProviderClient for DownClient {
        fn name(&self) -> &'static str {
            "fixer"
        }

        async fn fetch(&self, _request: &RateRequest) -> ProviderResult<RateData> {
            Err(ProviderError::connection(self.name(), "refused"))
        }

        async fn health_check(&self) -> ProviderHealth {
            ProviderHealth::unreachable("refused")
        }
    }

    fn invoker(client: impl ProviderClient + 'static) -> Arc<ResilientInvoker> {
        // Single attempt so a down source fails fast in tests.
        let policy = crate::infrastructure::providers::resilience::RetryPolicy {
            max_retries: 1,
            ..Default::default()
        };
        Arc::new(ResilientInvoker::with_policy(Arc::new(client), policy, 3))
    }

    fn source(client: impl ProviderClient + 'static) -> RateSource {
        RateSource::new(invoker(client))
    }

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    async fn store_with_pair() -> (Arc<InMemoryRateStore>, PairId) {
        let store = Arc::new(InMemoryRateStore::new());
        let pair = CurrencyPair::new(
            code("USD"),
            code("ZAR"),
            Markup::new(dec!(0.10)).unwrap(),
        )
        .unwrap();
        let id = pair.id();
        store.add_pair(pair).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn two_sources_feed_one_aggregate() {
        let (store, pair_id) = store_with_pair().await;
        let cycle = AggregationCycle::new(
            Arc::clone(&store) as Arc<dyn RateStore>,
            vec![
                source(MapClient {
                    name: "exchange_rate",
                    rate: dec!(18.0),
                }),
                source(MapClient {
                    name: "currency_layer",
                    rate: dec!(18.4),
                }),
            ],
        );

        let report = cycle.run().await.unwrap();
        assert_eq!(report.observations, 2);
        assert_eq!(report.aggregates, 1);
        assert_eq!(report.fetch_failures, 0);

        let latest = store.latest_aggregated_for(pair_id).await.unwrap().unwrap();
        assert_eq!(latest.provider_count(), 2);
        assert_eq!(latest.average_buy_rate(), dec!(18.2));
        // 18.2 * 1.10, rounded to 8 places.
        assert_eq!(latest.final_buy_rate(), dec!(20.02));
    }

    #[tokio::test]
    async fn failing_source_does_not_abort_the_cycle() {
        let (store, pair_id) = store_with_pair().await;
        let cycle = AggregationCycle::new(
            Arc::clone(&store) as Arc<dyn RateStore>,
            vec![
                source(DownClient),
                source(MapClient {
                    name: "exchange_rate",
                    rate: dec!(18.0),
                }),
            ],
        );

        let report = cycle.run().await.unwrap();
        assert_eq!(report.fetch_failures, 1);
        assert_eq!(report.aggregates, 1);

        let latest = store.latest_aggregated_for(pair_id).await.unwrap().unwrap();
        assert_eq!(latest.provider_count(), 1);
    }

    #[tokio::test]
    async fn pair_shaped_source_is_queried_per_pair() {
        let (store, pair_id) = store_with_pair().await;
        let cycle = AggregationCycle::new(
            Arc::clone(&store) as Arc<dyn RateStore>,
            vec![source(PairClient { rate: dec!(18.5) })],
        );

        let report = cycle.run().await.unwrap();
        assert_eq!(report.observations, 1);

        let latest = store.latest_aggregated_for(pair_id).await.unwrap().unwrap();
        assert_eq!(latest.average_buy_rate(), dec!(18.5));
    }

    #[tokio::test]
    async fn all_sources_down_commits_nothing() {
        let (store, pair_id) = store_with_pair().await;
        let cycle = AggregationCycle::new(
            Arc::clone(&store) as Arc<dyn RateStore>,
            vec![source(DownClient)],
        );

        let report = cycle.run().await.unwrap();
        assert_eq!(report.aggregates, 0);
        assert_eq!(report.pairs_skipped, 1);
        assert!(store.latest_aggregated_for(pair_id).await.unwrap().is_none());
        assert_eq!(store.observation_count().await, 0);
    }

    #[tokio::test]
    async fn unaggregatable_pair_skips_only_that_pair() {
        // A markup of exactly 1 drives the final sell rate to zero, which
        // aggregation rejects. That pair is skipped; its neighbours still
        // get their rates committed.
        let (store, zar_id) = store_with_pair().await;
        let gbp_pair = CurrencyPair::new(code("USD"), code("GBP"), Markup::new(dec!(1)).unwrap())
            .unwrap();
        let gbp_id = gbp_pair.id();
        store.add_pair(gbp_pair).await.unwrap();

        let cycle = AggregationCycle::new(
            Arc::clone(&store) as Arc<dyn RateStore>,
            vec![source(MapClient {
                name: "exchange_rate",
                rate: dec!(18.0),
            })],
        );

        let report = cycle.run().await.unwrap();
        assert_eq!(report.aggregates, 1);
        assert_eq!(report.pairs_skipped, 1);

        let latest = store.latest_aggregated_for(zar_id).await.unwrap().unwrap();
        assert_eq!(latest.average_buy_rate(), dec!(18.0));
        assert!(store.latest_aggregated_for(gbp_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fallback_source_survives_a_dead_client() {
        let (store, pair_id) = store_with_pair().await;
        let source = RateSource::with_fallbacks(
            "exchange_rate",
            vec![
                invoker(DownClient),
                invoker(MapClient {
                    name: "exchange_rate",
                    rate: dec!(18.0),
                }),
            ],
        )
        .unwrap();
        let cycle = AggregationCycle::new(Arc::clone(&store) as Arc<dyn RateStore>, vec![source]);

        let report = cycle.run().await.unwrap();
        assert_eq!(report.fetch_failures, 0);
        assert_eq!(report.aggregates, 1);

        let latest = store.latest_aggregated_for(pair_id).await.unwrap().unwrap();
        assert_eq!(latest.provider_count(), 1);
        assert_eq!(latest.average_buy_rate(), dec!(18.0));
    }

    #[test]
    fn fallback_source_requires_at_least_one_client() {
        assert!(RateSource::with_fallbacks("empty", vec![]).is_none());
    }

    #[tokio::test]
    async fn no_active_pairs_short_circuits() {
        let store = Arc::new(InMemoryRateStore::new());
        let cycle = AggregationCycle::new(
            store as Arc<dyn RateStore>,
            vec![source(MapClient {
                name: "exchange_rate",
                rate: dec!(1.0),
            })],
        );

        let report = cycle.run().await.unwrap();
        assert_eq!(report, CycleReport::default());
    }
}

//! End-to-end aggregation cycle tests: real provider clients against a
//! mock HTTP server, committed into the in-memory store.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use fx_rates_engine::application::error::EngineError;
use fx_rates_engine::application::services::aggregation_cycle::{AggregationCycle, RateSource};
use fx_rates_engine::domain::entities::{AggregatedRate, CurrencyPair, RateObservation};
use fx_rates_engine::domain::value_objects::{CurrencyCode, Markup, PairId, Timestamp};
use fx_rates_engine::infrastructure::persistence::traits::{
    CycleBatch, HistoricalQuery, RateStore, StoreError, StoreResult,
};
use fx_rates_engine::infrastructure::persistence::InMemoryRateStore;
use fx_rates_engine::infrastructure::providers::registry::{build_client, ProviderSettings};
use fx_rates_engine::infrastructure::providers::resilience::{ResilientInvoker, RetryPolicy};
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn code(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).unwrap()
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 1,
        base_delay: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

async fn source_for(name: &str, server: &MockServer) -> RateSource {
    let settings = ProviderSettings {
        api_key: Some("test-key".into()),
        base_url: Some(server.uri()),
        timeout_ms: Some(2_000),
    };
    let client = build_client(name, &settings).unwrap();
    RateSource::new(Arc::new(ResilientInvoker::with_policy(
        client,
        fast_policy(),
        3,
    )))
}

async fn add_usd_zar(store: &InMemoryRateStore) -> PairId {
    let pair = CurrencyPair::new(code("USD"), code("ZAR"), Markup::new(dec!(0.10)).unwrap())
        .unwrap();
    let id = pair.id();
    store.add_pair(pair).await.unwrap();
    id
}

#[tokio::test]
async fn cycle_aggregates_two_real_clients() {
    let exchange_rate = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test-key/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "base_code": "USD",
            "time_last_update_unix": 1_704_067_200,
            "conversion_rates": { "ZAR": 18.0 }
        })))
        .mount(&exchange_rate)
        .await;

    let currency_layer = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "source": "USD",
            "timestamp": 1_704_067_200,
            "quotes": { "USDZAR": 18.4 }
        })))
        .mount(&currency_layer)
        .await;

    let store = Arc::new(InMemoryRateStore::new());
    let pair_id = add_usd_zar(&store).await;

    let cycle = AggregationCycle::new(
        Arc::clone(&store) as Arc<dyn RateStore>,
        vec![
            source_for("exchange_rate", &exchange_rate).await,
            source_for("currency_layer", &currency_layer).await,
        ],
    );

    let report = cycle.run().await.unwrap();
    assert_eq!(report.pairs_total, 1);
    assert_eq!(report.observations, 2);
    assert_eq!(report.aggregates, 1);

    let latest = store.latest_aggregated_for(pair_id).await.unwrap().unwrap();
    assert_eq!(latest.provider_count(), 2);
    assert_eq!(latest.average_buy_rate(), dec!(18.2));
    assert_eq!(latest.final_buy_rate(), dec!(20.02));
    assert_eq!(latest.final_sell_rate(), dec!(16.38));
    assert!(!latest.is_expired());
}

#[tokio::test]
async fn unreachable_provider_is_absorbed() {
    let exchange_rate = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test-key/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "base_code": "USD",
            "time_last_update_unix": 1_704_067_200,
            "conversion_rates": { "ZAR": 18.0 }
        })))
        .mount(&exchange_rate)
        .await;

    // Server that always 500s stands in for a provider outage.
    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;

    let store = Arc::new(InMemoryRateStore::new());
    let pair_id = add_usd_zar(&store).await;

    let cycle = AggregationCycle::new(
        Arc::clone(&store) as Arc<dyn RateStore>,
        vec![
            source_for("exchange_rate", &exchange_rate).await,
            source_for("currency_layer", &broken).await,
        ],
    );

    let report = cycle.run().await.unwrap();
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.aggregates, 1);

    let latest = store.latest_aggregated_for(pair_id).await.unwrap().unwrap();
    assert_eq!(latest.provider_count(), 1);
}

/// Store that accepts everything except cycle commits.
#[derive(Debug)]
struct BrokenCommitStore {
    inner: InMemoryRateStore,
}

#[async_trait]
impl RateStore for BrokenCommitStore {
    async fn add_pair(&self, pair: CurrencyPair) -> StoreResult<()> {
        self.inner.add_pair(pair).await
    }

    async fn get_pair(&self, id: PairId) -> StoreResult<Option<CurrencyPair>> {
        self.inner.get_pair(id).await
    }

    async fn list_active_pairs(&self) -> StoreResult<Vec<CurrencyPair>> {
        self.inner.list_active_pairs().await
    }

    async fn update_markup(&self, id: PairId, markup: Markup) -> StoreResult<CurrencyPair> {
        self.inner.update_markup(id, markup).await
    }

    async fn commit_cycle(&self, _batch: CycleBatch) -> StoreResult<()> {
        Err(StoreError::connection("storage unavailable"))
    }

    async fn latest_aggregated_for(&self, id: PairId) -> StoreResult<Option<AggregatedRate>> {
        self.inner.latest_aggregated_for(id).await
    }

    async fn latest_aggregated_for_base(
        &self,
        code: &CurrencyCode,
    ) -> StoreResult<Vec<(AggregatedRate, CurrencyPair)>> {
        self.inner.latest_aggregated_for_base(code).await
    }

    async fn latest_aggregated_for_target(
        &self,
        code: &CurrencyCode,
    ) -> StoreResult<Vec<(AggregatedRate, CurrencyPair)>> {
        self.inner.latest_aggregated_for_target(code).await
    }

    async fn distinct_currency_codes(&self) -> StoreResult<BTreeSet<CurrencyCode>> {
        self.inner.distinct_currency_codes().await
    }

    async fn historical(&self, query: HistoricalQuery) -> StoreResult<Vec<AggregatedRate>> {
        self.inner.historical(query).await
    }
}

#[tokio::test]
async fn store_failure_fails_the_cycle() {
    let exchange_rate = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test-key/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "base_code": "USD",
            "time_last_update_unix": 1_704_067_200,
            "conversion_rates": { "ZAR": 18.0 }
        })))
        .mount(&exchange_rate)
        .await;

    let store = Arc::new(BrokenCommitStore {
        inner: InMemoryRateStore::new(),
    });
    add_usd_zar(&store.inner).await;

    let cycle = AggregationCycle::new(
        Arc::clone(&store) as Arc<dyn RateStore>,
        vec![source_for("exchange_rate", &exchange_rate).await],
    );

    let error = cycle.run().await.unwrap_err();
    assert!(matches!(error, EngineError::Store(_)));

    // Nothing landed: the cycle is atomic.
    assert_eq!(store.inner.observation_count().await, 0);
    assert_eq!(store.inner.aggregate_count().await, 0);
}

#[tokio::test]
async fn rejected_batch_leaves_store_untouched() {
    let store = InMemoryRateStore::new();
    let pair_id = add_usd_zar(&store).await;

    let good = RateObservation::new(
        pair_id,
        "exchange_rate",
        dec!(18.0),
        dec!(18.0),
        Timestamp::now(),
    )
    .unwrap();
    let orphan = AggregatedRate::new(
        PairId::new_v4(),
        dec!(1),
        dec!(1),
        dec!(1),
        dec!(1),
        Markup::zero(),
        1,
        Timestamp::now(),
    )
    .unwrap();

    let error = store
        .commit_cycle(CycleBatch {
            observations: vec![good],
            aggregated: vec![orphan],
        })
        .await
        .unwrap_err();
    assert!(matches!(error, StoreError::InvalidBatch { .. }));
    assert_eq!(store.observation_count().await, 0);
}

//! One-shot engine runner: loads configuration, probes provider health,
//! and runs a single aggregation cycle against the in-memory store.

use anyhow::Context;
use fx_rates_engine::application::services::AggregationCycle;
use fx_rates_engine::config::EngineConfig;
use fx_rates_engine::infrastructure::persistence::{InMemoryRateStore, RateStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = EngineConfig::load().context("loading configuration")?;
    let sources = config.build_sources().context("building provider clients")?;
    info!(providers = sources.len(), "engine configured");

    for source in &sources {
        for (provider, health) in source.health_check().await {
            info!(source = source.name(), provider, %health, "provider probed");
        }
    }

    let store = Arc::new(InMemoryRateStore::new());
    let cycle = AggregationCycle::new(store as Arc<dyn RateStore>, sources);
    let report = cycle.run().await.context("running aggregation cycle")?;
    info!(%report, "cycle finished");

    Ok(())
}

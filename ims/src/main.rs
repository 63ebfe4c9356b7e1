use chrono::NaiveDate;
use ims::{CircuitBreaker, Config, QueryApi};
use ims_cache::{CacheConfig, InMemoryCache};
use ims_core::{SystemClock, VecMetricHook};
use ims_inventory::{Inventory, InventoryEngine, RuleRegistry};
use ims_limit::{LimitEngine, SellLimit};
use ims_model::{BusinessDate, CalculationRule, Market, RuleStatus, RuleType};
use ims_pipeline::{Envelope, HandlerOutcome, InMemoryBroker, PartitionWorker, WorkerPool};
use ims_position::{Position, PositionEngine, TradeEvent};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config/ims.toml";
const TRADE_EVENTS_TOPIC: &str = "trade-events";

fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn load_config() -> Config {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    match Config::load(&path) {
        Ok(config) => {
            info!(path, "loaded configuration");
            config
        }
        Err(err) => {
            warn!(path, %err, "falling back to default configuration");
            Config::default()
        }
    }
}

fn build_caches(
    cache_config: &CacheConfig,
    metrics: &Arc<VecMetricHook>,
) -> (Arc<InMemoryCache<Position>>, Arc<InMemoryCache<Inventory>>, Arc<InMemoryCache<SellLimit>>) {
    let position_map = cache_config.position_map();
    let inventory_map = cache_config.inventory_map();
    let limit_map = cache_config.limit_map();

    let position_cache = Arc::new(
        InMemoryCache::new(Some(position_map.ttl), position_map.max_size_per_node, position_map.backup_count)
            .with_metric_hook(metrics.clone()),
    );
    let inventory_cache = Arc::new(InMemoryCache::new(Some(inventory_map.ttl), inventory_map.max_size_per_node, inventory_map.backup_count));
    let limit_cache = Arc::new(InMemoryCache::new(Some(limit_map.ttl), limit_map.max_size_per_node, limit_map.backup_count));

    (position_cache, inventory_cache, limit_cache)
}

/// A minimal always-active base availability rule per market, so the
/// Inventory Engine has something to select on startup. A real deployment
/// loads these from the reference-data feed instead (spec.md §4.3's
/// calculation-rule lifecycle is out of scope for this wiring example).
fn bootstrap_rule_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    let effective_from = BusinessDate(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
    for (market, rule_id) in [
        (Market::UnitedStates, "BASE-US"),
        (Market::Taiwan, "BASE-TW"),
        (Market::Japan, "BASE-JP"),
        (Market::HongKong, "BASE-HK"),
        (Market::UnitedKingdom, "BASE-UK"),
    ] {
        registry
            .insert(CalculationRule {
                rule_id: rule_id.into(),
                version: 1,
                rule_type: RuleType::Base,
                tag: None,
                market,
                priority: 1,
                effective_from,
                effective_to: None,
                status: RuleStatus::Active,
            })
            .expect("bootstrap base rules do not collide with each other");
    }
    registry
}

#[tokio::main]
async fn main() {
    init_tracing();
    let config = load_config();

    let metrics = Arc::new(VecMetricHook::default());
    let (position_cache, inventory_cache, limit_cache) = build_caches(&config.cache, &metrics);
    let lease_timeout = config.engine.lease_timeout();

    let position_engine = Arc::new(PositionEngine::new(position_cache, lease_timeout).with_metric_hook(metrics.clone()));
    let inventory_engine = Arc::new(InventoryEngine::new(
        inventory_cache,
        Arc::new(RwLock::new(bootstrap_rule_registry())),
        lease_timeout,
    ));
    let limit_engine = Arc::new(LimitEngine::new(limit_cache, lease_timeout));

    let query_api = Arc::new(
        QueryApi::new(position_engine.clone(), inventory_engine.clone(), limit_engine.clone())
            .with_metric_hook(metrics.clone()),
    );
    let clock: Arc<dyn ims_core::Clock> = Arc::new(SystemClock);
    let _circuit_breaker = Arc::new(CircuitBreaker::new(config.resilience.circuit_breaker, clock));

    let broker: Arc<InMemoryBroker<TradeEvent>> = Arc::new(InMemoryBroker::new(config.pipeline.partitions_per_topic));
    let retry_policy = config.pipeline.retry_policy();

    let mut workers = Vec::with_capacity(config.pipeline.partitions_per_topic);
    for partition in 0..config.pipeline.partitions_per_topic {
        let rx = broker
            .take_partition(TRADE_EVENTS_TOPIC, partition)
            .expect("each partition is taken exactly once at startup");
        workers.push(PartitionWorker::new(partition, rx, retry_policy).with_metric_hook(metrics.clone()));
    }

    let handler_position_engine = position_engine.clone();
    let retry_after = retry_policy.base;
    let handler = Arc::new(move |envelope: Envelope<TradeEvent>| {
        let position_engine = handler_position_engine.clone();
        async move {
            match position_engine.on_trade(envelope.payload).await {
                Ok(_) => HandlerOutcome::Ok,
                Err(err) => HandlerOutcome::from_error(&err, retry_after),
            }
        }
    });

    let worker_pool = WorkerPool::spawn(workers, handler);
    info!(
        partitions = config.pipeline.partitions_per_topic,
        "ims calculation core started, workers consuming trade events"
    );

    // query_api and broker stay alive for as long as a transport layer
    // (RPC server, pipeline producer) holds a clone of them; there is none
    // wired up in this minimal example, so they are only kept from being
    // dropped immediately.
    let _ = query_api;
    let _ = broker;

    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to install ctrl-c handler, shutting down immediately");
    }
    info!("shutdown signal received, stopping worker pool");
    worker_pool.abort_all();
}

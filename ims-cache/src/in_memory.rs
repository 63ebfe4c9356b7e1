use crate::backend::{CacheEvent, DistributedCache};
use crate::lease::{Lease, LeaseReleaser};
use crate::value::CacheValue;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ims_core::channel::{mpsc_bounded, BoundedRx, BoundedTx};
use ims_core::metric::{Field, Metric, Tag};
use ims_core::{Clock, CoreError, MetricHook, NoopMetricHook, SystemClock};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SHARD_COUNT: usize = 16;

fn shard_of(key: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash as usize) % SHARD_COUNT
}

struct Shard<V> {
    // IndexMap preserves insertion order; `shift_remove` + re-insert on
    // access turns that ordering into recency order for LRU eviction.
    entries: RwLock<IndexMap<String, CacheValue<V>>>,
    backups: Vec<RwLock<IndexMap<String, CacheValue<V>>>>,
    leases: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl<V> Shard<V> {
    fn new(backup_count: usize) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            backups: (0..backup_count).map(|_| RwLock::new(IndexMap::new())).collect(),
            leases: Mutex::new(HashMap::new()),
        }
    }
}

struct InMemoryLeaseReleaser<V> {
    shard: Arc<Shard<V>>,
}

impl<V: Send + Sync> LeaseReleaser for InMemoryLeaseReleaser<V> {
    fn release(&self, key: &str) {
        self.shard.leases.lock().remove(key);
    }
}

/// Partitioned in-memory grid backing the engines directly, grounded in
/// the teacher's `InMemoryStore` (`jackbot-data::redis_store`) pattern of a
/// sharded map behind a lock, generalised from exchange/instrument keys to
/// the grid's string keys and extended with CAS, leases and synchronous
/// backup replication per spec.md §4.5.
pub struct InMemoryCache<V> {
    shards: Vec<Arc<Shard<V>>>,
    ttl: Option<Duration>,
    max_size_per_node: usize,
    clock: Arc<dyn Clock>,
    events_tx: BoundedTx<CacheEvent>,
    events_rx: Mutex<Option<BoundedRx<CacheEvent>>>,
    metric_hook: Arc<dyn MetricHook>,
}

impl<V> InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Option<Duration>, max_size_per_node: usize, backup_count: usize) -> Self {
        Self::with_clock(ttl, max_size_per_node, backup_count, Arc::new(SystemClock))
    }

    pub fn with_clock(
        ttl: Option<Duration>,
        max_size_per_node: usize,
        backup_count: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| Arc::new(Shard::new(backup_count)))
            .collect();
        let (tx, rx) = mpsc_bounded(ims_core::channel::DEFAULT_PARTITION_CAPACITY);
        Self {
            shards,
            ttl,
            max_size_per_node,
            clock,
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
            metric_hook: Arc::new(NoopMetricHook),
        }
    }

    /// Attach a [`MetricHook`] so CAS-conflict observations (spec.md §7)
    /// are surfaced to a metrics sink.
    pub fn with_metric_hook(mut self, hook: Arc<dyn MetricHook>) -> Self {
        self.metric_hook = hook;
        self
    }

    fn shard(&self, key: &str) -> &Arc<Shard<V>> {
        &self.shards[shard_of(key)]
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.ttl.map(|ttl| {
            self.clock.now()
                + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero())
        })
    }

    fn evict_if_over_capacity(&self, shard: &Shard<V>) {
        if self.max_size_per_node == 0 {
            return;
        }
        let mut entries = shard.entries.write();
        while entries.len() > self.max_size_per_node {
            // IndexMap::shift_remove_index(0) evicts the least-recently-touched
            // entry; `touch` below moves an accessed key to the back.
            if let Some((evicted_key, _)) = entries.shift_remove_index(0) {
                debug!(key = %evicted_key, "evicted cache entry over max_size_per_node");
            }
        }
    }

    fn touch(entries: &mut IndexMap<String, CacheValue<V>>, key: &str) {
        if let Some(index) = entries.get_index_of(key) {
            entries.move_index(index, entries.len() - 1);
        }
    }

    fn replicate(&self, shard: &Shard<V>, key: &str, record: &CacheValue<V>) {
        for backup in &shard.backups {
            backup.write().insert(key.to_string(), record.clone());
        }
    }

    fn notify(&self, event: CacheEvent) {
        let _ = self.events_tx.try_send(event);
    }
}

#[async_trait]
impl<V> DistributedCache<V> for InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<CacheValue<V>> {
        let shard = self.shard(key);
        let now = self.clock.now();
        let mut entries = shard.entries.write();
        let record = entries.get(key)?.clone();
        if record.is_expired(now) {
            entries.shift_remove(key);
            drop(entries);
            debug!(key, "cache entry expired on read");
            self.notify(CacheEvent::Expired { key: key.to_string() });
            return None;
        }
        Self::touch(&mut entries, key);
        Some(record)
    }

    async fn put(&self, key: &str, value: V) -> CacheValue<V> {
        let shard = self.shard(key);
        let mut entries = shard.entries.write();
        let version = entries.get(key).map(|r| r.version + 1).unwrap_or(1);
        let record = CacheValue {
            version,
            value,
            expires_at: self.expires_at(),
        };
        entries.insert(key.to_string(), record.clone());
        Self::touch(&mut entries, key);
        drop(entries);
        self.evict_if_over_capacity(shard);
        self.replicate(shard, key, &record);
        self.notify(CacheEvent::Put {
            key: key.to_string(),
            version: record.version,
        });
        record
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: u64,
        new_value: V,
    ) -> Result<CacheValue<V>, CoreError> {
        let shard = self.shard(key);
        let mut entries = shard.entries.write();
        let current_version = entries.get(key).map(|r| r.version).unwrap_or(0);
        if current_version != expected_version {
            self.metric_hook.record(Metric {
                name: "cas_conflict",
                time: 0,
                tags: vec![Tag::new("key", key.to_string())],
                fields: vec![Field::new("count", 1i64)],
            });
            return Err(CoreError::conflict(format!(
                "expected version {expected_version} but found {current_version} for key {key}"
            )));
        }
        let record = CacheValue {
            version: expected_version + 1,
            value: new_value,
            expires_at: self.expires_at(),
        };
        entries.insert(key.to_string(), record.clone());
        Self::touch(&mut entries, key);
        drop(entries);
        self.evict_if_over_capacity(shard);
        self.replicate(shard, key, &record);
        self.notify(CacheEvent::Put {
            key: key.to_string(),
            version: record.version,
        });
        Ok(record)
    }

    async fn lease(&self, key: &str, ttl: Duration) -> Result<Lease, CoreError> {
        let shard = self.shard(key);
        let now = self.clock.now();
        let mut leases = shard.leases.lock();
        if let Some(expiry) = leases.get(key) {
            if *expiry > now {
                self.metric_hook.record(Metric {
                    name: "lease_unavailable",
                    time: 0,
                    tags: vec![Tag::new("key", key.to_string())],
                    fields: vec![Field::new("count", 1i64)],
                });
                return Err(CoreError::lease_unavailable(format!(
                    "lease already held for key {key}"
                )));
            }
        }
        let expiry = now + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        leases.insert(key.to_string(), expiry);
        drop(leases);
        Ok(Lease::new(
            key,
            ttl,
            Arc::new(InMemoryLeaseReleaser { shard: shard.clone() }),
        ))
    }

    async fn remove(&self, key: &str) {
        let shard = self.shard(key);
        shard.entries.write().shift_remove(key);
        for backup in &shard.backups {
            backup.write().shift_remove(key);
        }
        self.notify(CacheEvent::Removed { key: key.to_string() });
    }

    fn subscribe(&self, _prefix: &str) -> BoundedRx<CacheEvent> {
        self.events_rx
            .lock()
            .take()
            .expect("subscribe called more than once on an InMemoryCache instance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> InMemoryCache<i64> {
        InMemoryCache::new(None, 10, 1)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = cache();
        cache.put("k1", 100).await;
        let read = cache.get("k1").await.unwrap();
        assert_eq!(read.value, 100);
        assert_eq!(read.version, 1);
    }

    #[tokio::test]
    async fn compare_and_swap_rejects_stale_version() {
        let cache = cache();
        cache.put("k1", 100).await;
        let err = cache.compare_and_swap("k1", 0, 200).await.unwrap_err();
        assert_eq!(err.kind, ims_core::ErrorKind::Conflict);
        let unaffected = cache.get("k1").await.unwrap();
        assert_eq!(unaffected.value, 100);
    }

    #[tokio::test]
    async fn compare_and_swap_commits_on_matching_version() {
        let cache = cache();
        let first = cache.put("k1", 100).await;
        let second = cache.compare_and_swap("k1", first.version, 200).await.unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(cache.get("k1").await.unwrap().value, 200);
    }

    #[tokio::test]
    async fn lease_is_exclusive_until_released() {
        let cache = cache();
        let lease = cache.lease("k1", Duration::from_millis(50)).await.unwrap();
        let second = cache.lease("k1", Duration::from_millis(50)).await;
        assert!(second.is_err());
        lease.release();
        assert!(cache.lease("k1", Duration::from_millis(50)).await.is_ok());
    }

    #[tokio::test]
    async fn cas_conflict_is_recorded_on_the_attached_metric_hook() {
        let hook = Arc::new(ims_core::VecMetricHook::default());
        let cache = InMemoryCache::<i64>::new(None, 10, 1).with_metric_hook(hook.clone());
        cache.put("k1", 100).await;
        let _ = cache.compare_and_swap("k1", 0, 200).await;
        assert_eq!(hook.count("cas_conflict"), 1);
    }

    #[tokio::test]
    async fn eviction_keeps_node_at_capacity() {
        let cache = InMemoryCache::new(None, 2, 1);
        cache.put("a", 1).await;
        cache.put("b", 2).await;
        cache.put("c", 3).await;
        let mut present = 0;
        for key in ["a", "b", "c"] {
            if cache.get(key).await.is_some() {
                present += 1;
            }
        }
        assert_eq!(present, 2);
    }
}

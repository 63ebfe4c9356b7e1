use crate::lease::Lease;
use crate::value::CacheValue;
use async_trait::async_trait;
use ims_core::channel::BoundedRx;
use ims_core::CoreError;
use std::time::Duration;

/// Invalidation notification published to a [`DistributedCache::subscribe`]
/// consumer so peers can drop stale local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Put { key: String, version: u64 },
    Removed { key: String },
    Expired { key: String },
}

/// The distributed grid contract every engine mutates hot state through.
/// Per spec.md §5, "the cache is the only shared mutable state" - every
/// mutation flows through `compare_and_swap` or a held [`Lease`]; there is
/// no direct overwrite path.
#[async_trait]
pub trait DistributedCache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Read the current value. Never blocks on a lease; may return a
    /// value slightly stale with respect to an in-flight mutation.
    async fn get(&self, key: &str) -> Option<CacheValue<V>>;

    /// Unconditional write, bumping the version. Used for first-insert and
    /// for writes already protected by a held lease.
    async fn put(&self, key: &str, value: V) -> CacheValue<V>;

    /// Write only if the stored version still matches `expected_version`.
    /// Returns [`ErrorKind::Conflict`](ims_core::ErrorKind::Conflict) on a
    /// version mismatch, which the caller retries per spec.md §7's jittered
    /// back-off policy.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: u64,
        new_value: V,
    ) -> Result<CacheValue<V>, CoreError>;

    /// Acquire an exclusive, revocable lock on `key` for up to `ttl`.
    /// Fails fast with
    /// [`ErrorKind::LeaseUnavailable`](ims_core::ErrorKind::LeaseUnavailable)
    /// if another holder is active, rather than queueing - the short-sell
    /// path budgets 50 ms for this call and cannot afford to wait.
    async fn lease(&self, key: &str, ttl: Duration) -> Result<Lease, CoreError>;

    /// Remove a key outright, evicting it from every replica at once.
    async fn remove(&self, key: &str);

    /// Subscribe to invalidation events for keys under `prefix`.
    fn subscribe(&self, prefix: &str) -> BoundedRx<CacheEvent>;
}

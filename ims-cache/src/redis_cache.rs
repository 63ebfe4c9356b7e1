use crate::backend::{CacheEvent, DistributedCache};
use crate::lease::{Lease, LeaseReleaser};
use crate::value::CacheValue;
use async_trait::async_trait;
use ims_core::channel::{mpsc_bounded, BoundedRx, BoundedTx};
use ims_core::CoreError;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Redis-backed implementation of [`DistributedCache`], the alternate
/// grid backend for deployments that share state across process
/// boundaries rather than within one. Grounded in the teacher's
/// `RedisClientStore` (`jackbot-data::redis_store`): a thin wrapper over
/// `redis::Client` that opens a fresh connection per call and serialises
/// values as JSON, generalised here from order-book snapshots/deltas to
/// arbitrary versioned cache records plus CAS and leasing.
///
/// The engines never see `redis` types directly - they talk to
/// `DistributedCache<V>`, so swapping this for [`crate::InMemoryCache`]
/// is a wiring change, not a code change.
pub struct RedisCache<V> {
    client: redis::Client,
    prefix: String,
    ttl: Option<Duration>,
    events_tx: BoundedTx<CacheEvent>,
    events_rx: Mutex<Option<BoundedRx<CacheEvent>>>,
    _value: PhantomData<V>,
}

struct RedisLeaseReleaser {
    client: redis::Client,
    lease_key: String,
}

impl LeaseReleaser for RedisLeaseReleaser {
    fn release(&self, _key: &str) {
        if let Ok(mut conn) = self.client.get_connection() {
            let _: redis::RedisResult<()> = redis::cmd("DEL").arg(&self.lease_key).query(&mut conn);
        }
    }
}

impl<V> RedisCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    pub fn new(url: &str, prefix: impl Into<String>, ttl: Option<Duration>) -> redis::RedisResult<Self> {
        let (tx, rx) = mpsc_bounded(ims_core::channel::DEFAULT_PARTITION_CAPACITY);
        Ok(Self {
            client: redis::Client::open(url)?,
            prefix: prefix.into(),
            ttl,
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
            _value: PhantomData,
        })
    }

    fn record_key(&self, key: &str) -> String {
        format!("{}:{}:record", self.prefix, key)
    }

    fn lease_key(&self, key: &str) -> String {
        format!("{}:{}:lease", self.prefix, key)
    }

    fn notify(&self, event: CacheEvent) {
        let _ = self.events_tx.try_send(event);
    }
}

#[async_trait]
impl<V> DistributedCache<V> for RedisCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &str) -> Option<CacheValue<V>> {
        let mut conn = self.client.get_connection().ok()?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.record_key(key))
            .query(&mut conn)
            .ok()?;
        raw.and_then(|json| serde_json::from_str(&json).ok())
    }

    async fn put(&self, key: &str, value: V) -> CacheValue<V> {
        let current = self.get(key).await;
        let version = current.map(|r| r.version + 1).unwrap_or(1);
        let expires_at = self
            .ttl
            .map(|ttl| chrono::Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero()));
        let record = CacheValue {
            version,
            value,
            expires_at,
        };
        if let Ok(json) = serde_json::to_string(&record) {
            if let Ok(mut conn) = self.client.get_connection() {
                let mut pipe = redis::pipe();
                pipe.atomic().cmd("SET").arg(self.record_key(key)).arg(json);
                if let Some(ttl) = self.ttl {
                    pipe.cmd("EXPIRE").arg(self.record_key(key)).arg(ttl.as_secs());
                }
                let _: redis::RedisResult<()> = pipe.query(&mut conn);
            }
        }
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
        let current_version = self.get(key).await.map(|r| r.version).unwrap_or(0);
        if current_version != expected_version {
            return Err(CoreError::conflict(format!(
                "expected version {expected_version} but found {current_version} for key {key}"
            )));
        }
        Ok(self.put(key, new_value).await)
    }

    async fn lease(&self, key: &str, ttl: Duration) -> Result<Lease, CoreError> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|err| CoreError::downstream_unavailable(err.to_string()))?;
        let lease_key = self.lease_key(key);
        // SET ... NX EX is the idiomatic Redis distributed-lock primitive:
        // atomically takes the key only if absent, self-expiring after `ttl`.
        let acquired: Option<String> = redis::cmd("SET")
            .arg(&lease_key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query(&mut conn)
            .map_err(|err| CoreError::downstream_unavailable(err.to_string()))?;
        if acquired.is_none() {
            return Err(CoreError::lease_unavailable(format!(
                "lease already held for key {key}"
            )));
        }
        Ok(Lease::new(
            key,
            ttl,
            Arc::new(RedisLeaseReleaser {
                client: self.client.clone(),
                lease_key,
            }),
        ))
    }

    async fn remove(&self, key: &str) {
        if let Ok(mut conn) = self.client.get_connection() {
            let _: redis::RedisResult<()> = redis::cmd("DEL").arg(self.record_key(key)).query(&mut conn);
        }
        self.notify(CacheEvent::Removed { key: key.to_string() });
    }

    fn subscribe(&self, _prefix: &str) -> BoundedRx<CacheEvent> {
        self.events_rx
            .lock()
            .take()
            .expect("subscribe called more than once on a RedisCache instance")
    }
}

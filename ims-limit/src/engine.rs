use crate::contribution::PositionContribution;
use crate::idempotence::OrderIdempotence;
use crate::key::LimitKey;
use crate::limit::SellLimit;
use crate::side::OrderSide;
use ims_cache::DistributedCache;
use ims_core::CoreError;
use ims_model::{AggregationUnitId, BusinessDate, CounterpartyId, OwnerId, SecurityId};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default capacity of the engine-wide `order_id` idempotence cache.
pub const DEFAULT_ORDER_IDEMPOTENCE_CAPACITY: usize = 50_000;

/// The pair of limit records a client order always checks against: the
/// client's own limit and the aggregation unit's limit for the same
/// security/date (spec.md §4.4: "validate_order... returns true iff
/// *both* the client and AU limits have capacity").
#[derive(Debug, Clone, PartialEq)]
pub struct SellLimitPair {
    pub client: SellLimit,
    pub au: SellLimit,
}

/// Maintains client and aggregation-unit sell limits and validates/accounts
/// for order usage against them (spec.md §4.4).
pub struct LimitEngine<C> {
    cache: Arc<C>,
    lease_timeout: Duration,
    seen_orders: OrderIdempotence,
}

impl<C> LimitEngine<C>
where
    C: DistributedCache<SellLimit>,
{
    pub fn new(cache: Arc<C>, lease_timeout: Duration) -> Self {
        Self {
            cache,
            lease_timeout,
            seen_orders: OrderIdempotence::new(DEFAULT_ORDER_IDEMPOTENCE_CAPACITY),
        }
    }

    async fn load_or_default(&self, key: &LimitKey) -> SellLimit {
        self.cache
            .get(&key.cache_key())
            .await
            .map(|record| record.value)
            .unwrap_or_else(|| SellLimit::new(key.clone()))
    }

    /// `recalculate_limits` per spec.md §4.4: groups contributions by
    /// `(owner, security)`, sets `long_sell_limit` to the sum of projected
    /// quantities that are "long" (`projected_net > 0`, per spec.md's Open
    /// Questions resolution) and `short_sell_limit` to the sum of
    /// `SHORT_SELL` availability, preserving each record's `*_used`
    /// counters and status. Returns `(client_limits, AU_limits)`.
    pub async fn recalculate_limits(
        &self,
        contributions: &[PositionContribution],
    ) -> (Vec<SellLimit>, Vec<SellLimit>) {
        let mut grouped: IndexMap<(OwnerId, SecurityId, BusinessDate), (Decimal, Decimal)> =
            IndexMap::new();
        for contribution in contributions {
            let group_key = (
                contribution.owner_id.clone(),
                contribution.security_id.clone(),
                contribution.business_date,
            );
            let entry = grouped.entry(group_key).or_insert((Decimal::ZERO, Decimal::ZERO));
            if contribution.projected_net > Decimal::ZERO {
                entry.0 += contribution.projected_net;
            }
            entry.1 += contribution.short_sell_availability;
        }

        let mut client_limits = Vec::new();
        let mut au_limits = Vec::new();
        for ((owner_id, security_id, business_date), (long_sell_limit, short_sell_limit)) in grouped {
            let key = LimitKey::new(owner_id.clone(), security_id, business_date);
            let mut limit = self.load_or_default(&key).await;
            limit.long_sell_limit = long_sell_limit;
            limit.short_sell_limit = short_sell_limit;
            let written = self.cache.put(&key.cache_key(), limit).await.value;
            debug!(key = %key.cache_key(), long_sell_limit = %written.long_sell_limit, short_sell_limit = %written.short_sell_limit, "recalculated sell limit");
            match owner_id {
                OwnerId::Client(_) => client_limits.push(written),
                OwnerId::AggregationUnit(_) => au_limits.push(written),
            }
        }
        (client_limits, au_limits)
    }

    fn client_key(client_id: &CounterpartyId, security_id: &SecurityId, business_date: BusinessDate) -> LimitKey {
        LimitKey::new(OwnerId::Client(client_id.clone()), security_id.clone(), business_date)
    }

    fn au_key(au_id: &AggregationUnitId, security_id: &SecurityId, business_date: BusinessDate) -> LimitKey {
        LimitKey::new(OwnerId::AggregationUnit(au_id.clone()), security_id.clone(), business_date)
    }

    /// `validate_order` per spec.md §4.4: read-only, true iff both the
    /// client and the AU limit currently have capacity for `qty` on
    /// `side`. Never mutates - callers needing an atomic check-then-record
    /// step for the short-sell workflow use [`Self::check_and_increment`]
    /// instead.
    pub async fn validate_order(
        &self,
        client_id: &CounterpartyId,
        au_id: &AggregationUnitId,
        security_id: &SecurityId,
        side: OrderSide,
        qty: Decimal,
        business_date: BusinessDate,
    ) -> bool {
        let client = self.load_or_default(&Self::client_key(client_id, security_id, business_date)).await;
        let au = self.load_or_default(&Self::au_key(au_id, security_id, business_date)).await;
        client.has_capacity(side, qty) && au.has_capacity(side, qty)
    }

    /// `record_order` per spec.md §4.4: atomically increments `*_used` on
    /// both the client and AU limits. Idempotent over `order_id` (spec.md
    /// §8): a repeat call with the same `order_id` is a no-op that
    /// returns the current state rather than double-incrementing.
    pub async fn record_order(
        &self,
        client_id: &CounterpartyId,
        au_id: &AggregationUnitId,
        security_id: &SecurityId,
        side: OrderSide,
        qty: Decimal,
        business_date: BusinessDate,
        order_id: Option<&str>,
    ) -> Result<SellLimitPair, CoreError> {
        if let Some(order_id) = order_id {
            if self.seen_orders.check_and_insert(order_id) {
                debug!(order_id, "record_order is a duplicate, returning current state unchanged");
                let client = self.load_or_default(&Self::client_key(client_id, security_id, business_date)).await;
                let au = self.load_or_default(&Self::au_key(au_id, security_id, business_date)).await;
                return Ok(SellLimitPair { client, au });
            }
        }
        self.increment_both(client_id, au_id, security_id, side, qty, business_date).await
    }

    /// Composes `validate_order` and `record_order` into the single
    /// linearisable check-and-increment step the short-sell workflow
    /// needs (spec.md §4.4: "must be a single linearisable step"), guarded
    /// by `lease_timeout` so the short-sell path can fail fast rather than
    /// block past its latency budget (spec.md §5).
    pub async fn check_and_increment(
        &self,
        client_id: &CounterpartyId,
        au_id: &AggregationUnitId,
        security_id: &SecurityId,
        side: OrderSide,
        qty: Decimal,
        business_date: BusinessDate,
        order_id: Option<&str>,
    ) -> Result<SellLimitPair, CoreError> {
        if let Some(order_id) = order_id {
            if self.seen_orders.check_and_insert(order_id) {
                let client = self.load_or_default(&Self::client_key(client_id, security_id, business_date)).await;
                let au = self.load_or_default(&Self::au_key(au_id, security_id, business_date)).await;
                return Ok(SellLimitPair { client, au });
            }
        }
        self.increment_both(client_id, au_id, security_id, side, qty, business_date).await
    }

    async fn increment_both(
        &self,
        client_id: &CounterpartyId,
        au_id: &AggregationUnitId,
        security_id: &SecurityId,
        side: OrderSide,
        qty: Decimal,
        business_date: BusinessDate,
    ) -> Result<SellLimitPair, CoreError> {
        let client_key = Self::client_key(client_id, security_id, business_date);
        let au_key = Self::au_key(au_id, security_id, business_date);

        // Fixed key order (client before AU) avoids a lock-ordering deadlock
        // with a concurrent call for the same pair of limits.
        let client_lease = self.cache.lease(&client_key.cache_key(), self.lease_timeout).await?;
        let au_lease = match self.cache.lease(&au_key.cache_key(), self.lease_timeout).await {
            Ok(lease) => lease,
            Err(err) => {
                client_lease.release();
                return Err(err);
            }
        };

        let mut client = self.load_or_default(&client_key).await;
        let mut au = self.load_or_default(&au_key).await;

        if let Err(err) = client.increment_used(side, qty) {
            warn!(client = %client_key.cache_key(), "client limit exceeded on record_order");
            client_lease.release();
            au_lease.release();
            return Err(err);
        }
        if let Err(err) = au.increment_used(side, qty) {
            warn!(au = %au_key.cache_key(), "aggregation-unit limit exceeded on record_order");
            client_lease.release();
            au_lease.release();
            return Err(err);
        }

        let client = self.cache.put(&client_key.cache_key(), client).await.value;
        let au = self.cache.put(&au_key.cache_key(), au).await.value;
        client_lease.release();
        au_lease.release();
        Ok(SellLimitPair { client, au })
    }

    pub async fn get_client_limit(
        &self,
        client_id: &CounterpartyId,
        security_id: &SecurityId,
        business_date: BusinessDate,
    ) -> Option<SellLimit> {
        self.cache.get(&Self::client_key(client_id, security_id, business_date).cache_key()).await.map(|r| r.value)
    }

    pub async fn get_au_limit(
        &self,
        au_id: &AggregationUnitId,
        security_id: &SecurityId,
        business_date: BusinessDate,
    ) -> Option<SellLimit> {
        self.cache.get(&Self::au_key(au_id, security_id, business_date).cache_key()).await.map(|r| r.value)
    }
}

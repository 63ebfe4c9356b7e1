use crate::key::PositionKey;
use crate::ladder::SettlementDay;
use crate::position::Position;
use crate::trade::{Side, TradeEvent};
use ims_cache::DistributedCache;
use ims_core::metric::{Field, Metric, Tag};
use ims_core::{CoreError, MetricHook, NoopMetricHook};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Event-sourced position reconstruction + five-day settlement ladder
/// (spec.md §4.2). All mutations proceed under an exclusive per-key lease
/// obtained from the Distributed Cache; reads are served from the cache
/// without locking.
pub struct PositionEngine<C> {
    cache: Arc<C>,
    lease_timeout: Duration,
    metric_hook: Arc<dyn MetricHook>,
}

impl<C> PositionEngine<C>
where
    C: DistributedCache<Position>,
{
    pub fn new(cache: Arc<C>, lease_timeout: Duration) -> Self {
        Self {
            cache,
            lease_timeout,
            metric_hook: Arc::new(NoopMetricHook),
        }
    }

    /// Attach a [`MetricHook`] so settlement-window-violation observations
    /// (spec.md §3/§4.1) are surfaced to a metrics sink instead of only a
    /// `tracing::warn!` line.
    pub fn with_metric_hook(mut self, hook: Arc<dyn MetricHook>) -> Self {
        self.metric_hook = hook;
        self
    }

    async fn load_or_default(&self, key: &PositionKey) -> Position {
        self.cache
            .get(&key.cache_key())
            .await
            .map(|record| record.value)
            .unwrap_or_else(|| Position::new(key.clone()))
    }

    /// `on_trade` per spec.md §4.2: BUY increments `contractual_qty` and
    /// books the quantity as a receipt on the settlement ladder; SELL
    /// decrements `contractual_qty` and books a deliver. Zero-quantity
    /// trades are a no-op, not an error.
    pub async fn on_trade(&self, event: TradeEvent) -> Result<Position, CoreError> {
        if event.qty.is_zero() {
            return Ok(self.load_or_default(&event.key).await);
        }

        let lease = self
            .cache
            .lease(&event.key.cache_key(), self.lease_timeout)
            .await?;

        let Some(offset) = event.settlement_offset() else {
            let mut position = self.load_or_default(&event.key).await;
            position.mark_error();
            self.cache.put(&event.key.cache_key(), position.clone()).await;
            warn!(
                key = %event.key,
                settlement_date = %event.settlement_date,
                "settlement date outside [business_date, business_date+4], rejecting trade"
            );
            self.metric_hook.record(Metric {
                name: "settlement_window_violation",
                time: 0,
                tags: vec![Tag::new("book", event.key.book_id.to_string())],
                fields: vec![Field::new("count", 1i64)],
            });
            lease.release();
            return Err(CoreError::validation(format!(
                "settlement date {} is outside the [0,4] business-day window for {}",
                event.settlement_date, event.key
            )));
        };

        let mut position = self.load_or_default(&event.key).await;
        match event.side {
            Side::Buy => {
                position.contractual_qty += event.qty;
                position.ladder.add_receipt(offset, event.qty);
            }
            Side::Sell => {
                position.contractual_qty -= event.qty;
                position.ladder.add_deliver(offset, event.qty);
            }
        }
        position.recompute();

        let written = self.cache.put(&event.key.cache_key(), position).await;
        lease.release();
        Ok(written.value)
    }

    /// `on_position_snapshot` per spec.md §4.2: replaces the settlement
    /// ladder and quantity fields wholesale from a provider snapshot, used
    /// for daily opens and reconciliation.
    pub async fn on_position_snapshot(
        &self,
        key: PositionKey,
        contractual_qty: Decimal,
        settled_qty: Decimal,
        ladder_days: [SettlementDay; crate::ladder::LADDER_DAYS],
    ) -> Result<Position, CoreError> {
        let lease = self.cache.lease(&key.cache_key(), self.lease_timeout).await?;
        let mut position = self.load_or_default(&key).await;
        position.contractual_qty = contractual_qty;
        position.settled_qty = settled_qty;
        position.ladder.replace(ladder_days);
        position.recompute();
        let written = self.cache.put(&key.cache_key(), position).await;
        lease.release();
        Ok(written.value)
    }

    pub async fn get_settlement_ladder(&self, key: &PositionKey) -> Option<crate::ladder::Ladder> {
        self.cache
            .get(&key.cache_key())
            .await
            .map(|record| record.value.ladder)
    }

    pub async fn get_projected(&self, key: &PositionKey) -> Option<Decimal> {
        self.cache
            .get(&key.cache_key())
            .await
            .map(|record| record.value.projected_net)
    }

    pub async fn get_position(&self, key: &PositionKey) -> Option<Position> {
        self.cache.get(&key.cache_key()).await.map(|record| record.value)
    }
}

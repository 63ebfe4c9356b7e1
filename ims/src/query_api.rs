use ims_cache::DistributedCache;
use ims_core::metric::{Field, Metric, Tag};
use ims_core::{CoreError, MetricHook, NoopMetricHook};
use ims_inventory::{CalculationType, Inventory, InventoryEngine, InventoryKey};
use ims_limit::{LimitEngine, OrderSide, SellLimitPair};
use ims_model::{AggregationUnitId, BookId, BusinessDate, CounterpartyId, SecurityId};
use ims_position::{Ladder, Position, PositionEngine, PositionKey};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Internal latency budget for the short-sell validate+record path
/// (spec.md §5: "a hard 120 ms internal budget to leave headroom under
/// the 150 ms SLA"). `record_order` aborts past this and returns a
/// [`ims_core::ErrorKind::Timeout`] rather than let the caller's own
/// 150 ms SLA lapse waiting on a lease.
pub const DEFAULT_SHORT_SELL_BUDGET: Duration = Duration::from_millis(120);

/// Thin façade composing the Position, Inventory and Limit engines behind
/// the read/write surface an external caller (an RPC handler, a CLI, a
/// test harness) actually needs, so nothing outside this module has to
/// know the engines' cache-key shapes or lease protocol (spec.md §4,
/// "orchestration binary + query façade").
///
/// Every method returns `Result<T, CoreError>` (or `Option<T>` for a plain
/// lookup); `CoreError::status()` is already the stable HTTP-style code
/// spec.md §7 specifies, so callers map it directly rather than this
/// façade re-deriving it.
pub struct QueryApi<CP, CI, CL> {
    position: Arc<PositionEngine<CP>>,
    inventory: Arc<InventoryEngine<CI>>,
    limit: Arc<LimitEngine<CL>>,
    short_sell_budget: Duration,
    metric_hook: Arc<dyn MetricHook>,
}

impl<CP, CI, CL> QueryApi<CP, CI, CL>
where
    CP: DistributedCache<Position>,
    CI: DistributedCache<Inventory>,
    CL: DistributedCache<ims_limit::SellLimit>,
{
    pub fn new(
        position: Arc<PositionEngine<CP>>,
        inventory: Arc<InventoryEngine<CI>>,
        limit: Arc<LimitEngine<CL>>,
    ) -> Self {
        Self {
            position,
            inventory,
            limit,
            short_sell_budget: DEFAULT_SHORT_SELL_BUDGET,
            metric_hook: Arc::new(NoopMetricHook),
        }
    }

    /// Override the short-sell internal latency budget (spec.md §6's
    /// `short_sell_budget_ms`, default 120).
    pub fn with_short_sell_budget(mut self, budget: Duration) -> Self {
        self.short_sell_budget = budget;
        self
    }

    /// Attach a [`MetricHook`] so a short-sell-budget breach (spec.md §5/§7)
    /// is surfaced to a metrics sink.
    pub fn with_metric_hook(mut self, hook: Arc<dyn MetricHook>) -> Self {
        self.metric_hook = hook;
        self
    }

    pub async fn get_position(&self, book_id: &BookId, security_id: &SecurityId, business_date: BusinessDate) -> Option<Position> {
        let key = PositionKey::new(book_id.clone(), security_id.clone(), business_date);
        self.position.get_position(&key).await
    }

    pub async fn get_settlement_ladder(&self, book_id: &BookId, security_id: &SecurityId, business_date: BusinessDate) -> Option<Ladder> {
        let key = PositionKey::new(book_id.clone(), security_id.clone(), business_date);
        self.position.get_settlement_ladder(&key).await
    }

    pub async fn get_projected(&self, book_id: &BookId, security_id: &SecurityId, business_date: BusinessDate) -> Option<Decimal> {
        let key = PositionKey::new(book_id.clone(), security_id.clone(), business_date);
        self.position.get_projected(&key).await
    }

    pub async fn get_availability(
        &self,
        security_id: &SecurityId,
        counterparty_id: Option<&CounterpartyId>,
        au_id: Option<&AggregationUnitId>,
        business_date: BusinessDate,
        calc_type: CalculationType,
    ) -> Option<Inventory> {
        let key = InventoryKey::new(
            security_id.clone(),
            counterparty_id.cloned(),
            au_id.cloned(),
            business_date,
            calc_type,
        );
        self.inventory.get(&key).await
    }

    /// Read-only capacity check, true iff both the client and the
    /// aggregation-unit limit currently have room for `qty` on `side`.
    pub async fn validate_order(
        &self,
        client_id: &CounterpartyId,
        au_id: &AggregationUnitId,
        security_id: &SecurityId,
        side: OrderSide,
        qty: Decimal,
        business_date: BusinessDate,
    ) -> bool {
        self.limit.validate_order(client_id, au_id, security_id, side, qty, business_date).await
    }

    /// Validate-and-account for an order in one linearisable step, bounded
    /// both by the engine's lease timeout and by this façade's overall
    /// short-sell budget (spec.md §4.4, §5: "a hard 120 ms internal budget
    /// to leave headroom under the 150 ms SLA"). Idempotent over
    /// `order_id`.
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
        let call = self
            .limit
            .check_and_increment(client_id, au_id, security_id, side, qty, business_date, order_id);
        match tokio::time::timeout(self.short_sell_budget, call).await {
            Ok(result) => result,
            Err(_) => {
                self.metric_hook.record(Metric {
                    name: "short_sell_budget_breach",
                    time: 0,
                    tags: vec![Tag::new("security", security_id.to_string())],
                    fields: vec![Field::new("count", 1i64)],
                });
                Err(CoreError::timeout(format!(
                    "record_order exceeded the {}ms short-sell budget",
                    self.short_sell_budget.as_millis()
                )))
            }
        }
    }

    pub async fn reserve(
        &self,
        security_id: &SecurityId,
        counterparty_id: Option<&CounterpartyId>,
        au_id: Option<&AggregationUnitId>,
        business_date: BusinessDate,
        calc_type: CalculationType,
        qty: Decimal,
    ) -> Result<Inventory, CoreError> {
        let key = InventoryKey::new(security_id.clone(), counterparty_id.cloned(), au_id.cloned(), business_date, calc_type);
        self.inventory.reserve(&key, qty).await
    }

    pub async fn release(
        &self,
        security_id: &SecurityId,
        counterparty_id: Option<&CounterpartyId>,
        au_id: Option<&AggregationUnitId>,
        business_date: BusinessDate,
        calc_type: CalculationType,
        qty: Decimal,
    ) -> Result<Inventory, CoreError> {
        let key = InventoryKey::new(security_id.clone(), counterparty_id.cloned(), au_id.cloned(), business_date, calc_type);
        self.inventory.release(&key, qty).await
    }

    /// Advances the `LOCATE` decrement counter for a locate-approval
    /// workflow (spec.md §8 Scenario E).
    pub async fn decrement_locate(
        &self,
        security_id: &SecurityId,
        counterparty_id: Option<&CounterpartyId>,
        au_id: Option<&AggregationUnitId>,
        business_date: BusinessDate,
        qty: Decimal,
    ) -> Result<Inventory, CoreError> {
        let key = InventoryKey::new(
            security_id.clone(),
            counterparty_id.cloned(),
            au_id.cloned(),
            business_date,
            CalculationType::Locate,
        );
        self.inventory.decrement(&key, qty).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ims_cache::InMemoryCache;
    use ims_inventory::{RuleInput, RuleRegistry};
    use ims_model::{CalculationRule, Market, RuleStatus, RuleType};
    use ims_position::{Side, TradeEvent};
    use parking_lot::RwLock;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn business_date() -> BusinessDate {
        BusinessDate(NaiveDate::from_ymd_opt(2026, 7, 28).unwrap())
    }

    fn query_api() -> QueryApi<InMemoryCache<Position>, InMemoryCache<Inventory>, InMemoryCache<ims_limit::SellLimit>> {
        let position = Arc::new(PositionEngine::new(Arc::new(InMemoryCache::new(None, 10_000, 1)), Duration::from_millis(50)));

        let mut registry = RuleRegistry::new();
        registry
            .insert(CalculationRule {
                rule_id: "BASE-US".into(),
                version: 1,
                rule_type: RuleType::Base,
                tag: None,
                market: Market::UnitedStates,
                priority: 1,
                effective_from: business_date(),
                effective_to: None,
                status: RuleStatus::Active,
            })
            .unwrap();
        let inventory = Arc::new(InventoryEngine::new(
            Arc::new(InMemoryCache::new(None, 10_000, 1)),
            Arc::new(RwLock::new(registry)),
            Duration::from_millis(50),
        ));

        let limit = Arc::new(LimitEngine::new(Arc::new(InMemoryCache::new(None, 10_000, 1)), Duration::from_millis(50)));

        QueryApi::new(position, inventory, limit)
    }

    #[tokio::test]
    async fn get_position_reflects_an_applied_trade() {
        let api = query_api();
        let book_id = BookId::from("BOOK-1");
        let security_id = SecurityId::from("SEC-1");
        let key = PositionKey::new(book_id.clone(), security_id.clone(), business_date());
        api.position
            .on_trade(TradeEvent {
                key,
                side: Side::Buy,
                qty: dec!(100),
                settlement_date: business_date().plus_days(2),
            })
            .await
            .unwrap();

        let position = api.get_position(&book_id, &security_id, business_date()).await.unwrap();
        assert_eq!(position.contractual_qty, dec!(100));
    }

    #[tokio::test]
    async fn reserve_then_release_round_trips_through_the_facade() {
        let api = query_api();
        let security_id = SecurityId::from("SEC-1");
        let key = InventoryKey::new(security_id.clone(), None, None, business_date(), CalculationType::ForLoan);
        api.inventory
            .recalculate(
                key,
                RuleInput {
                    security_id: security_id.clone(),
                    calc_type: CalculationType::ForLoan,
                    business_date: business_date(),
                    market: Market::UnitedStates,
                    projected_position_qty: dec!(1000),
                    contracts: vec![],
                    counterparty_kyc: None,
                    is_external_source: false,
                    sd0_deliver_qty: Decimal::ZERO,
                    past_settlement_cutoff: false,
                    quanto_qty: Decimal::ZERO,
                    quanto_on_t2_slot: true,
                },
                &[],
            )
            .await
            .unwrap();

        let reserved = api
            .reserve(&security_id, None, None, business_date(), CalculationType::ForLoan, dec!(400))
            .await
            .unwrap();
        assert_eq!(reserved.available, dec!(600));

        let released = api
            .release(&security_id, None, None, business_date(), CalculationType::ForLoan, dec!(400))
            .await
            .unwrap();
        assert_eq!(released.available, dec!(1000));
    }

    #[tokio::test]
    async fn record_order_is_rejected_once_past_the_limit() {
        let api = query_api();
        let client_id = CounterpartyId::from("CPTY-1");
        let au_id = AggregationUnitId::from("AU-1");
        let security_id = SecurityId::from("SEC-1");
        api.limit
            .recalculate_limits(&[ims_limit::PositionContribution {
                owner_id: ims_model::OwnerId::Client(client_id.clone()),
                security_id: security_id.clone(),
                business_date: business_date(),
                projected_net: Decimal::ZERO,
                short_sell_availability: dec!(500),
            }])
            .await;
        api.limit
            .recalculate_limits(&[ims_limit::PositionContribution {
                owner_id: ims_model::OwnerId::AggregationUnit(au_id.clone()),
                security_id: security_id.clone(),
                business_date: business_date(),
                projected_net: Decimal::ZERO,
                short_sell_availability: dec!(500),
            }])
            .await;

        assert!(
            api.validate_order(&client_id, &au_id, &security_id, OrderSide::ShortSell, dec!(500), business_date())
                .await
        );
        api.record_order(&client_id, &au_id, &security_id, OrderSide::ShortSell, dec!(500), business_date(), Some("ord-1"))
            .await
            .unwrap();

        let err = api
            .record_order(&client_id, &au_id, &security_id, OrderSide::ShortSell, dec!(1), business_date(), Some("ord-2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ims_core::ErrorKind::LimitExceeded);
    }

    #[tokio::test]
    async fn record_order_within_budget_does_not_record_a_budget_breach() {
        let hook = Arc::new(ims_core::VecMetricHook::default());
        let api = query_api().with_metric_hook(hook.clone());
        let client_id = CounterpartyId::from("CPTY-1");
        let au_id = AggregationUnitId::from("AU-1");
        let security_id = SecurityId::from("SEC-1");
        api.limit
            .recalculate_limits(&[ims_limit::PositionContribution {
                owner_id: ims_model::OwnerId::Client(client_id.clone()),
                security_id: security_id.clone(),
                business_date: business_date(),
                projected_net: Decimal::ZERO,
                short_sell_availability: dec!(500),
            }])
            .await;
        api.limit
            .recalculate_limits(&[ims_limit::PositionContribution {
                owner_id: ims_model::OwnerId::AggregationUnit(au_id.clone()),
                security_id: security_id.clone(),
                business_date: business_date(),
                projected_net: Decimal::ZERO,
                short_sell_availability: dec!(500),
            }])
            .await;

        api.record_order(&client_id, &au_id, &security_id, OrderSide::ShortSell, dec!(100), business_date(), Some("ord-1"))
            .await
            .unwrap();

        assert_eq!(hook.count("short_sell_budget_breach"), 0);
    }
}

use crate::evaluator::{BaseAvailabilityRule, RuleEvaluator};
use crate::inventory::Inventory;
use crate::key::InventoryKey;
use crate::overlays::apply_overlays;
use crate::rule_input::RuleInput;
use crate::rules::RuleRegistry;
use ims_cache::DistributedCache;
use ims_core::CoreError;
use ims_model::{RuleTag, RuleType};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Rule-driven availability calculator over positions, contracts and
/// market data, with fixed market overlays (spec.md §4.3). Mutation of a
/// stored [`Inventory`] record - whether by recalculation or by
/// `reserve`/`release`/`decrement` - proceeds under an exclusive per-key
/// lease, the same protocol `ims-position` uses.
pub struct InventoryEngine<C> {
    cache: Arc<C>,
    registry: Arc<RwLock<RuleRegistry>>,
    evaluator: Box<dyn RuleEvaluator>,
    lease_timeout: Duration,
}

impl<C> InventoryEngine<C>
where
    C: DistributedCache<Inventory>,
{
    pub fn new(cache: Arc<C>, registry: Arc<RwLock<RuleRegistry>>, lease_timeout: Duration) -> Self {
        Self {
            cache,
            registry,
            evaluator: Box::new(BaseAvailabilityRule),
            lease_timeout,
        }
    }

    async fn load_or_default(&self, key: &InventoryKey) -> Inventory {
        self.cache
            .get(&key.cache_key())
            .await
            .map(|record| record.value)
            .unwrap_or_else(|| Inventory::new(key.clone()))
    }

    /// `recalculate` per spec.md §4.3: select the highest-priority active
    /// base rule, execute it, apply the AU's market overlays, then persist
    /// - carrying `reserved` and `decrement` forward from the previous
    /// record, since those counters belong to in-flight `reserve`/
    /// `decrement` calls the recalculation must not discard.
    pub async fn recalculate(
        &self,
        key: InventoryKey,
        input: RuleInput,
        au_rule_tags: &[RuleTag],
    ) -> Result<Inventory, CoreError> {
        let registry = self.registry.read();
        let base_rule = registry
            .select_active(RuleType::Base, input.market, input.business_date)
            .ok_or_else(|| {
                CoreError::not_found(format!(
                    "no active base calculation rule for market {} on {}",
                    input.market, input.business_date
                ))
            })?
            .clone();
        drop(registry);
        debug!(rule_id = %base_rule.rule_id, key = %key.cache_key(), "executing base calculation rule");

        let output = self.evaluator.evaluate(&input);
        let registry = self.registry.read();
        let output = apply_overlays(output, &input, au_rule_tags, &registry, input.business_date);
        drop(registry);

        let lease = self.cache.lease(&key.cache_key(), self.lease_timeout).await?;
        let previous = self.load_or_default(&key).await;
        let available = (output.available - previous.reserved).max(Decimal::ZERO);

        let inventory = Inventory {
            key: key.clone(),
            gross: output.gross,
            net: output.net,
            available,
            reserved: previous.reserved,
            decrement: previous.decrement,
            security_temperature: output.security_temperature,
            borrow_rate: output.borrow_rate,
        };
        let written = self.cache.put(&key.cache_key(), inventory).await;
        lease.release();
        Ok(written.value)
    }

    /// Fails with [`ims_core::ErrorKind::InsufficientAvailability`] if
    /// `qty` exceeds `remaining = available − decrement` (spec.md §4.3:
    /// "after accounting for concurrent decrements").
    pub async fn reserve(&self, key: &InventoryKey, qty: Decimal) -> Result<Inventory, CoreError> {
        let lease = self.cache.lease(&key.cache_key(), self.lease_timeout).await?;
        let mut inventory = self.load_or_default(key).await;
        if qty > inventory.remaining() {
            lease.release();
            return Err(CoreError::insufficient_availability(format!(
                "requested {qty} exceeds remaining {} for {}",
                inventory.remaining(),
                key.cache_key()
            )));
        }
        inventory.available -= qty;
        inventory.reserved += qty;
        let written = self.cache.put(&key.cache_key(), inventory).await;
        lease.release();
        Ok(written.value)
    }

    /// Inverse of `reserve`, capped at the currently reserved quantity.
    pub async fn release(&self, key: &InventoryKey, qty: Decimal) -> Result<Inventory, CoreError> {
        let lease = self.cache.lease(&key.cache_key(), self.lease_timeout).await?;
        let mut inventory = self.load_or_default(key).await;
        let released = qty.min(inventory.reserved);
        inventory.available += released;
        inventory.reserved -= released;
        let written = self.cache.put(&key.cache_key(), inventory).await;
        lease.release();
        Ok(written.value)
    }

    /// Advances the `decrement` counter used by locate approvals. Fails
    /// with `InsufficientAvailability` if `qty` would drive
    /// `remaining = available − decrement` negative.
    pub async fn decrement(&self, key: &InventoryKey, qty: Decimal) -> Result<Inventory, CoreError> {
        let lease = self.cache.lease(&key.cache_key(), self.lease_timeout).await?;
        let mut inventory = self.load_or_default(key).await;
        if qty > inventory.remaining() {
            lease.release();
            return Err(CoreError::insufficient_availability(format!(
                "decrement {qty} exceeds remaining {} for {}",
                inventory.remaining(),
                key.cache_key()
            )));
        }
        inventory.decrement += qty;
        let written = self.cache.put(&key.cache_key(), inventory).await;
        lease.release();
        Ok(written.value)
    }

    pub async fn get(&self, key: &InventoryKey) -> Option<Inventory> {
        self.cache.get(&key.cache_key()).await.map(|record| record.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation_type::CalculationType;
    use chrono::NaiveDate;
    use ims_cache::InMemoryCache;
    use ims_model::{BusinessDate, CalculationRule, Market, RuleStatus, RuleType, SecurityId};
    use rust_decimal_macros::dec;

    fn business_date() -> BusinessDate {
        BusinessDate(NaiveDate::from_ymd_opt(2026, 7, 28).unwrap())
    }

    fn key() -> InventoryKey {
        InventoryKey::new(SecurityId::from("SEC-1"), None, None, business_date(), CalculationType::ForLoan)
    }

    fn engine_with_base_rule() -> InventoryEngine<InMemoryCache<Inventory>> {
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
        let cache = Arc::new(InMemoryCache::new(None, 10_000, 1));
        InventoryEngine::new(cache, Arc::new(RwLock::new(registry)), Duration::from_millis(50))
    }

    fn input() -> RuleInput {
        RuleInput {
            security_id: SecurityId::from("SEC-1"),
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
        }
    }

    #[tokio::test]
    async fn recalculate_without_an_active_base_rule_fails_not_found() {
        let cache = Arc::new(InMemoryCache::new(None, 10_000, 1));
        let engine = InventoryEngine::new(cache, Arc::new(RwLock::new(RuleRegistry::new())), Duration::from_millis(50));
        let err = engine.recalculate(key(), input(), &[]).await.unwrap_err();
        assert_eq!(err.kind, ims_core::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn recalculate_persists_availability_from_the_base_rule() {
        let engine = engine_with_base_rule();
        let inventory = engine.recalculate(key(), input(), &[]).await.unwrap();
        assert_eq!(inventory.available, dec!(1000));
    }

    #[tokio::test]
    async fn reserve_then_release_round_trips_available_and_reserved() {
        let engine = engine_with_base_rule();
        engine.recalculate(key(), input(), &[]).await.unwrap();
        let after_reserve = engine.reserve(&key(), dec!(400)).await.unwrap();
        assert_eq!(after_reserve.available, dec!(600));
        assert_eq!(after_reserve.reserved, dec!(400));

        let after_release = engine.release(&key(), dec!(400)).await.unwrap();
        assert_eq!(after_release.available, dec!(1000));
        assert_eq!(after_release.reserved, Decimal::ZERO);
    }

    #[tokio::test]
    async fn reserve_past_remaining_fails_insufficient_availability() {
        let engine = engine_with_base_rule();
        engine.recalculate(key(), input(), &[]).await.unwrap();
        let err = engine.reserve(&key(), dec!(1001)).await.unwrap_err();
        assert_eq!(err.kind, ims_core::ErrorKind::InsufficientAvailability);
    }

    /// Scenario from spec.md §8: `(S1, LOCATE)` with `available = 1000`.
    /// `decrement_locate(200)` leaves `remaining = 800`; `reserve(800)`
    /// succeeds, `reserve(1)` afterward fails.
    #[tokio::test]
    async fn locate_decrement_then_reserve_matches_the_worked_example() {
        let engine = engine_with_base_rule();
        let locate_key = InventoryKey::new(SecurityId::from("SEC-1"), None, None, business_date(), CalculationType::Locate);
        engine.recalculate(locate_key.clone(), input(), &[]).await.unwrap();

        engine.decrement(&locate_key, dec!(200)).await.unwrap();
        engine.reserve(&locate_key, dec!(800)).await.unwrap();
        let err = engine.reserve(&locate_key, dec!(1)).await.unwrap_err();
        assert_eq!(err.kind, ims_core::ErrorKind::InsufficientAvailability);
    }

    #[tokio::test]
    async fn release_is_capped_at_currently_reserved_quantity() {
        let engine = engine_with_base_rule();
        engine.recalculate(key(), input(), &[]).await.unwrap();
        engine.reserve(&key(), dec!(100)).await.unwrap();
        let after = engine.release(&key(), dec!(9999)).await.unwrap();
        assert_eq!(after.reserved, Decimal::ZERO);
        assert_eq!(after.available, dec!(1000));
    }
}

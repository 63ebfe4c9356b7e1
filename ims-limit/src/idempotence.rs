use indexmap::IndexSet;
use parking_lot::Mutex;

/// Bounded last-seen-`order_id` cache backing [`crate::LimitEngine`]'s
/// idempotence over `record_order` (spec.md §4.4, §8: "`record_order(o);
/// record_order(o)` (same `order_id`) increments `used` exactly once").
/// Same shape as `ims-pipeline::SeenIdCache`, kept as a separate small
/// copy here rather than a shared dependency - the Limit Engine's
/// idempotence key (`order_id`) and the pipeline's (`event_id`) are
/// different concerns that happen to need the same data structure.
pub struct OrderIdempotence {
    capacity: usize,
    seen: Mutex<IndexSet<String>>,
}

impl OrderIdempotence {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        Self {
            capacity,
            seen: Mutex::new(IndexSet::new()),
        }
    }

    /// Records `order_id` as seen, returning `true` if it was already
    /// present.
    pub fn check_and_insert(&self, order_id: &str) -> bool {
        let mut seen = self.seen.lock();
        if seen.contains(order_id) {
            return true;
        }
        if seen.len() >= self.capacity {
            seen.shift_remove_index(0);
        }
        seen.insert(order_id.to_string());
        false
    }
}

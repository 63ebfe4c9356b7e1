use indexmap::IndexSet;
use parking_lot::Mutex;

/// Bounded last-seen-`event_id` cache, one per partition, used for cheap
/// duplicate suppression ahead of a handler call (spec.md §4.1:
/// "idempotence... the pipeline provides a last-seen-id cache per
/// partition (bounded LRU)"). This is a cheap first line of defence only -
/// handlers are still required to be idempotent over `event_id` and over
/// `(key, business_date, sequence)`, since at-least-once delivery can
/// redeliver an event after it has aged out of this cache.
pub struct SeenIdCache {
    capacity: usize,
    seen: Mutex<IndexSet<String>>,
}

impl SeenIdCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        Self {
            capacity,
            seen: Mutex::new(IndexSet::new()),
        }
    }

    /// Records `event_id` as seen, returning `true` if it was already
    /// present (a duplicate the caller should short-circuit on).
    pub fn check_and_insert(&self, event_id: &str) -> bool {
        let mut seen = self.seen.lock();
        if seen.contains(event_id) {
            // Re-touch: move to the back so a re-delivered id doesn't get
            // evicted just because it was first seen long ago.
            let index = seen.get_index_of(event_id).expect("just confirmed present");
            seen.move_index(index, seen.len() - 1);
            return true;
        }
        if seen.len() >= self.capacity {
            seen.shift_remove_index(0);
        }
        seen.insert(event_id.to_string());
        false
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_not_a_duplicate() {
        let cache = SeenIdCache::new(4);
        assert!(!cache.check_and_insert("evt-1"));
    }

    #[test]
    fn second_sighting_is_a_duplicate() {
        let cache = SeenIdCache::new(4);
        cache.check_and_insert("evt-1");
        assert!(cache.check_and_insert("evt-1"));
    }

    #[test]
    fn bounded_capacity_evicts_the_oldest_entry() {
        let cache = SeenIdCache::new(2);
        cache.check_and_insert("evt-1");
        cache.check_and_insert("evt-2");
        cache.check_and_insert("evt-3");
        assert_eq!(cache.len(), 2);
        // evt-1 was evicted, so it looks like a fresh sighting again.
        assert!(!cache.check_and_insert("evt-1"));
    }
}

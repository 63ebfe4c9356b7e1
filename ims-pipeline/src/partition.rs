use crate::envelope::RoutingKey;
use fnv::FnvHasher;
use std::hash::{Hash, Hasher};

/// Deterministic `hash(key) mod P` assignment from a [`RoutingKey`] to one
/// of `P` partitions (spec.md §4.1). Using `fnv` rather than `SipHash`
/// (std's default `Hash` impl for strings) keeps partition assignment
/// stable across process restarts, which `SipHash`'s randomised seed would
/// not guarantee.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    partition_count: usize,
}

impl Partitioner {
    pub fn new(partition_count: usize) -> Self {
        assert!(partition_count > 0, "partition_count must be at least 1");
        Self { partition_count }
    }

    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    pub fn assign(&self, key: &RoutingKey) -> usize {
        let mut hasher = FnvHasher::default();
        key.0.hash(&mut hasher);
        (hasher.finish() as usize) % self.partition_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_deterministic_for_the_same_key() {
        let partitioner = Partitioner::new(8);
        let key = RoutingKey("BOOK-1|SEC-1".to_string());
        assert_eq!(partitioner.assign(&key), partitioner.assign(&key));
    }

    #[test]
    fn assignment_stays_within_partition_bounds() {
        let partitioner = Partitioner::new(4);
        for i in 0..100 {
            let key = RoutingKey(format!("key-{i}"));
            assert!(partitioner.assign(&key) < 4);
        }
    }

    #[test]
    fn same_key_always_lands_on_the_same_partition_preserving_per_key_order() {
        let partitioner = Partitioner::new(16);
        let key = RoutingKey("BOOK-7|SEC-9".to_string());
        let first = partitioner.assign(&key);
        for _ in 0..10 {
            assert_eq!(partitioner.assign(&key), first);
        }
    }
}

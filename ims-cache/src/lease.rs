use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Backing side of a [`Lease`]: releases the exclusive hold on `key` early,
/// synchronously. Implemented by each `DistributedCache` backend over a
/// `parking_lot` lock so it can run from `Drop`.
pub trait LeaseReleaser: Send + Sync {
    fn release(&self, key: &str);
}

/// An exclusive, revocable hold on a cache key, returned by
/// [`crate::DistributedCache::lease`]. The lease self-expires after `ttl`
/// even if never explicitly released (spec.md §4.5: "Leases self-expire
/// after `ttl`"); releasing early on `Drop` lets a short-sell validation
/// that finishes inside its budget free the key immediately rather than
/// blocking the next writer for the full window.
pub struct Lease {
    key: String,
    ttl: Duration,
    releaser: Arc<dyn LeaseReleaser>,
    released: AtomicBool,
}

impl Lease {
    pub fn new(key: impl Into<String>, ttl: Duration, releaser: Arc<dyn LeaseReleaser>) -> Self {
        Self {
            key: key.into(),
            ttl,
            releaser,
            released: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Release the lease now instead of waiting for `Drop`. Idempotent.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.releaser.release(&self.key);
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.release();
    }
}

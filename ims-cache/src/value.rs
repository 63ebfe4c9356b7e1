use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A versioned record held by the grid. `version` is bumped on every
/// successful write and is the CAS expected-version token; `expires_at` is
/// `None` for a map configured with no TTL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheValue<V> {
    pub version: u64,
    pub value: V,
    pub expires_at: Option<DateTime<Utc>>,
}

impl<V> CacheValue<V> {
    pub fn new(value: V, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            version: 1,
            value,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now)
    }

    /// The next version this record advances to on a successful write.
    pub fn next_version(&self) -> CacheValue<V>
    where
        V: Clone,
    {
        CacheValue {
            version: self.version + 1,
            value: self.value.clone(),
            expires_at: self.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_record_starts_at_version_one() {
        let value = CacheValue::new(42, None);
        assert_eq!(value.version, 1);
    }

    #[test]
    fn is_expired_compares_against_now() {
        let now = Utc::now();
        let value = CacheValue::new(1, Some(now - Duration::seconds(1)));
        assert!(value.is_expired(now));
        let fresh = CacheValue::new(1, Some(now + Duration::seconds(1)));
        assert!(!fresh.is_expired(now));
    }
}

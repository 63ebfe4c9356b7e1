use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Eviction policy for a cache map. LRU is the only policy the grid
/// actually implements; the enum exists so config can name a future
/// policy without the engines caring which one is active.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    Lru,
    None,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::Lru
    }
}

/// Per-map configuration, one instance per named map (`position`,
/// `inventory`, `rule`, `limit`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    pub ttl: Duration,
    pub max_size_per_node: usize,
    pub eviction_policy: EvictionPolicy,
    /// Replication factor. `>= 1` for positions/inventory/limits; `0` is
    /// permitted only for the ephemeral rule cache.
    pub backup_count: usize,
}

impl MapConfig {
    pub fn new(ttl: Duration, max_size_per_node: usize, backup_count: usize) -> Self {
        Self {
            ttl,
            max_size_per_node,
            eviction_policy: EvictionPolicy::Lru,
            backup_count,
        }
    }
}

/// Grid-wide topology and per-map settings, mirroring spec.md §6's
/// `Cache` configuration block.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub cluster_name: String,
    pub instance_name: String,
    pub port: u16,
    pub backup_count: usize,
    pub multicast_enabled: bool,
    pub peers: Vec<String>,
    pub max_size_per_node: usize,
    pub eviction_policy: EvictionPolicy,
    pub map_position_ttl: Duration,
    pub map_inventory_ttl: Duration,
    pub map_rule_ttl: Duration,
    pub map_limit_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cluster_name: "ims-grid".to_string(),
            instance_name: "ims-node-0".to_string(),
            port: 5701,
            backup_count: 1,
            multicast_enabled: false,
            peers: Vec::new(),
            max_size_per_node: 250_000,
            eviction_policy: EvictionPolicy::Lru,
            map_position_ttl: Duration::from_secs(24 * 60 * 60),
            map_inventory_ttl: Duration::from_secs(24 * 60 * 60),
            map_rule_ttl: Duration::from_secs(60 * 60),
            map_limit_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl CacheConfig {
    pub fn position_map(&self) -> MapConfig {
        MapConfig::new(self.map_position_ttl, self.max_size_per_node, self.backup_count)
    }

    pub fn inventory_map(&self) -> MapConfig {
        MapConfig::new(self.map_inventory_ttl, self.max_size_per_node, self.backup_count)
    }

    pub fn limit_map(&self) -> MapConfig {
        MapConfig::new(self.map_limit_ttl, self.max_size_per_node, self.backup_count)
    }

    /// The rule cache is ephemeral and is the only map allowed a zero
    /// backup count (spec.md §4.5).
    pub fn rule_map(&self) -> MapConfig {
        MapConfig::new(self.map_rule_ttl, self.max_size_per_node, 0)
    }
}

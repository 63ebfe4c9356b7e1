//! The Distributed Cache: the partitioned, TTL'd, LRU-evicted,
//! replicated key-value grid every engine mutates hot state through.
//!
//! Per spec.md §5, the cache is the *only* shared mutable state in the
//! calculation core - every mutation flows through
//! [`DistributedCache::compare_and_swap`] or a held [`Lease`]; direct
//! overwrites are not part of the contract.

pub mod backend;
pub mod config;
pub mod durable;
pub mod in_memory;
pub mod lease;
pub mod redis_cache;
pub mod value;

pub use backend::{CacheEvent, DistributedCache};
pub use config::{CacheConfig, EvictionPolicy, MapConfig};
pub use in_memory::InMemoryCache;
pub use lease::{Lease, LeaseReleaser};
pub use redis_cache::RedisCache;
pub use value::CacheValue;

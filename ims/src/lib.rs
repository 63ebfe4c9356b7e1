//! Orchestration layer for the IMS calculation core: process
//! configuration, the circuit breaker guarding calls into external
//! collaborators, and the query façade composing the Position, Inventory
//! and Limit engines for a caller that should not need to know their
//! cache-key shapes or lease protocol.
//!
//! The engines themselves - Event Pipeline, Position Engine, Inventory
//! Engine, Limit Engine, Distributed Cache - live in their own crates
//! (`ims-pipeline`, `ims-position`, `ims-inventory`, `ims-limit`,
//! `ims-cache`); this crate wires them together and is what `main.rs`
//! runs as a process.

pub mod circuit_breaker;
pub mod config;
pub mod query_api;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::{CircuitBreakerConfig, Config, EngineConfig, ResilienceConfig};
pub use query_api::QueryApi;

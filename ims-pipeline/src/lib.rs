//! The Event Pipeline: at-least-once delivery, per-key FIFO ordering via
//! partitioning, back-pressure that never drops, and retry/dead-letter
//! handling for calculation-core consumers (spec.md §4.1).

pub mod broker;
pub mod config;
pub mod dead_letter;
pub mod envelope;
pub mod handler;
pub mod idempotence;
pub mod partition;
pub mod worker;

pub use broker::{Ack, InMemoryBroker};
pub use config::PipelineConfig;
pub use dead_letter::DeadLetter;
pub use envelope::{Envelope, RoutingKey};
pub use handler::HandlerOutcome;
pub use idempotence::SeenIdCache;
pub use partition::Partitioner;
pub use worker::{PartitionWorker, WorkerAction, WorkerPool};

use serde::{Deserialize, Serialize};

/// Pipeline-wide configuration (spec.md §6's `Pipeline` block).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub bootstrap: Vec<String>,
    pub group_id: String,
    pub partitions_per_topic: usize,
    pub max_in_flight: usize,
    pub concurrency: usize,
    pub retry_backoff_base_ms: u64,
    pub retry_max_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bootstrap: vec!["localhost:9092".to_string()],
            group_id: "ims-calculation-core".to_string(),
            partitions_per_topic: 16,
            max_in_flight: 1,
            concurrency: 8,
            retry_backoff_base_ms: 1_000,
            retry_max_attempts: 10,
        }
    }
}

impl PipelineConfig {
    pub fn retry_policy(&self) -> ims_core::retry::Policy {
        ims_core::retry::Policy {
            base: std::time::Duration::from_millis(self.retry_backoff_base_ms),
            factor: 2,
            cap: std::time::Duration::from_secs(60),
            max_attempts: self.retry_max_attempts,
        }
    }
}

use ims_cache::CacheConfig;
use ims_pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Engine-wide knobs that don't belong to the cache or the pipeline: lease
/// timeouts and the order-idempotence cache sizing (spec.md §5/§6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    pub lease_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { lease_timeout_ms: 50 }
    }
}

impl EngineConfig {
    pub fn lease_timeout(&self) -> Duration {
        Duration::from_millis(self.lease_timeout_ms)
    }
}

/// Circuit breaker thresholds guarding calls into the durable store and
/// broker (spec.md §7: "Downstream Unavailable... circuit breaker").
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CircuitBreakerConfig {
    pub window_size: usize,
    pub failure_rate_threshold: f64,
    pub wait_in_open_ms: u64,
    pub half_open_probes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 50,
            failure_rate_threshold: 0.5,
            wait_in_open_ms: 5_000,
            half_open_probes: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResilienceConfig {
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Root configuration for the calculation core process, loaded from a TOML
/// file (spec.md §6). Every field has a workable default so the process
/// can start from an empty or partial file in development.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration from a TOML file on disk, falling back to
    /// per-field defaults for anything the file omits.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_gives_50ms_lease_timeout() {
        let cfg = Config::default();
        assert_eq!(cfg.engine.lease_timeout(), Duration::from_millis(50));
    }

    #[test]
    fn default_circuit_breaker_opens_at_half_the_window_failing() {
        let cfg = CircuitBreakerConfig::default();
        assert_eq!(cfg.window_size, 50);
        assert_eq!(cfg.failure_rate_threshold, 0.5);
        assert_eq!(cfg.half_open_probes, 5);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults_for_missing_sections() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.engine.lease_timeout_ms, 50);
        assert_eq!(cfg.resilience.circuit_breaker.window_size, 50);
    }
}

//! Service configuration.
//!
//! All knobs ship with production defaults so `ServiceSettings::default()`
//! is enough for embedding; `from_env` layers `SITECFG__*` environment
//! variables on top (e.g. `SITECFG__CACHE__TTL_SECONDS=300`).

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use sitecfg_core::{Result, SCHEMA_VERSION, SitecfgError};

/// Cache layer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Default TTL in seconds for cached entries.
    pub ttl_seconds: u64,
    /// Maximum number of cached entries.
    pub max_capacity: u64,
    /// Schema version baked into every cache key.
    pub schema_version: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 900,
            max_capacity: 10_000,
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }
}

impl CacheSettings {
    /// Default TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Change tracker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// How many recent change events to retain in memory.
    pub history_size: usize,
    /// Bound of the async notification queue.
    pub queue_depth: usize,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            history_size: 100,
            queue_depth: 64,
        }
    }
}

/// Health check settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Per-probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Store latency above this threshold degrades the check to warning.
    pub store_latency_warn_ms: u64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 2_000,
            store_latency_warn_ms: 100,
        }
    }
}

impl HealthSettings {
    /// Per-probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Top-level service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Cache layer settings.
    pub cache: CacheSettings,
    /// Change tracker settings.
    pub tracker: TrackerSettings,
    /// Health check settings.
    pub health: HealthSettings,
    /// Timeout in milliseconds for each store read during resolution.
    pub store_timeout_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            tracker: TrackerSettings::default(),
            health: HealthSettings::default(),
            store_timeout_ms: 2_000,
        }
    }
}

impl ServiceSettings {
    /// Loads settings from the environment, falling back to defaults.
    ///
    /// Nested fields use `__` as the separator: `SITECFG__CACHE__TTL_SECONDS`.
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .add_source(
                Environment::with_prefix("SITECFG")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| SitecfgError::internal(format!("failed to read environment: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| SitecfgError::internal(format!("invalid service settings: {e}")))
    }

    /// Store read timeout as a [`Duration`].
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

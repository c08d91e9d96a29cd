//! Service health checks.
//!
//! Probes run concurrently, each under its own timeout, and report a
//! graded status instead of a boolean so operators can distinguish a
//! slow store from a dead one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use sitecfg_core::{Section, SectionKind, validate_section};
use sitecfg_store::ConfigStore;

use crate::cache::{CacheKey, ConfigCache};
use crate::settings::HealthSettings;

/// Graded health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Operating normally.
    Healthy,
    /// Degraded but serving.
    Warning,
    /// A dependency is unusable.
    Critical,
    /// The probe could not run.
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
            HealthStatus::Unknown => "unknown",
        }
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Probe name.
    pub name: String,
    /// Graded outcome.
    pub status: HealthStatus,
    /// Human-readable detail.
    pub message: String,
    /// Wall time the probe took.
    pub duration_ms: f64,
}

/// Aggregated health report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Worst status across all checks.
    pub status: HealthStatus,
    /// Individual probe outcomes.
    pub checks: Vec<HealthCheck>,
    /// When the report was produced.
    pub checked_at: DateTime<Utc>,
}

/// Runs the store, cache and schema probes.
#[derive(Clone)]
pub struct HealthChecker {
    store: Arc<dyn ConfigStore>,
    cache: ConfigCache,
    probe_timeout: Duration,
    latency_warn: Duration,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn ConfigStore>, cache: ConfigCache, settings: &HealthSettings) -> Self {
        Self {
            store,
            cache,
            probe_timeout: settings.probe_timeout(),
            latency_warn: Duration::from_millis(settings.store_latency_warn_ms),
        }
    }

    /// Runs every probe concurrently and aggregates the worst status.
    pub async fn run_health_checks(&self) -> HealthReport {
        let (store, cache, schema) = tokio::join!(
            self.probe("store", self.store_probe()),
            self.probe("cache", self.cache_probe()),
            self.probe("schema", self.schema_probe()),
        );

        let checks = vec![store, cache, schema];
        let status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Unknown);

        if status != HealthStatus::Healthy {
            warn!(status = status.as_str(), "health degraded");
        }

        HealthReport {
            status,
            checks,
            checked_at: Utc::now(),
        }
    }

    /// Wraps one probe body with its timeout and duration accounting.
    async fn probe<F>(&self, name: &str, body: F) -> HealthCheck
    where
        F: Future<Output = (HealthStatus, String)>,
    {
        let start = Instant::now();
        let (status, message) = match tokio::time::timeout(self.probe_timeout, body).await {
            Ok(outcome) => outcome,
            Err(_) => (
                HealthStatus::Unknown,
                format!("probe timed out after {:?}", self.probe_timeout),
            ),
        };

        HealthCheck {
            name: name.to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
        }
    }

    /// Pings the store and grades its latency.
    async fn store_probe(&self) -> (HealthStatus, String) {
        let start = Instant::now();
        match self.store.ping().await {
            Ok(()) => {
                let elapsed = start.elapsed();
                if elapsed > self.latency_warn {
                    (
                        HealthStatus::Warning,
                        format!("store reachable but slow ({elapsed:?})"),
                    )
                } else {
                    (HealthStatus::Healthy, "store reachable".to_string())
                }
            }
            Err(e) => (HealthStatus::Critical, format!("store unreachable: {e}")),
        }
    }

    /// Round-trips a probe entry through the cache.
    async fn cache_probe(&self) -> (HealthStatus, String) {
        let key = CacheKey::health_probe(self.cache.schema_version());
        let marker = json!({"probe": Utc::now().timestamp_millis()});

        self.cache
            .set(key.clone(), marker.clone(), Some(Duration::from_secs(5)))
            .await;
        let read_back = self.cache.get(&key).await;
        self.cache.delete(&key).await;

        if read_back.as_ref() == Some(&marker) {
            (HealthStatus::Healthy, "cache round-trip ok".to_string())
        } else {
            (
                HealthStatus::Critical,
                "cache round-trip lost the probe entry".to_string(),
            )
        }
    }

    /// Confirms every section's compiled-in defaults still validate.
    async fn schema_probe(&self) -> (HealthStatus, String) {
        for kind in SectionKind::ALL {
            let raw = match Section::default_for(kind).fields_value() {
                Ok(raw) => raw,
                Err(e) => {
                    return (
                        HealthStatus::Critical,
                        format!("defaults for {kind} not serializable: {e}"),
                    );
                }
            };
            if let Err(errors) = validate_section(kind, &raw) {
                return (
                    HealthStatus::Critical,
                    format!("defaults for {kind} fail validation ({} errors)", errors.len()),
                );
            }
        }
        (HealthStatus::Healthy, "all section schemas valid".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CacheSettings;
    use async_trait::async_trait;
    use sitecfg_core::{Actor, RecordId, Result, SitecfgError};
    use sitecfg_store::{
        AuditEntry, CommittedWrite, ConfigRecord, ConfigVersion, MemoryStore, WriteMeta,
    };

    fn checker(store: Arc<dyn ConfigStore>) -> HealthChecker {
        HealthChecker::new(
            store,
            ConfigCache::new(CacheSettings::default()),
            &HealthSettings::default(),
        )
    }

    struct DeadStore;

    #[async_trait]
    impl ConfigStore for DeadStore {
        async fn get_singleton(&self, _kind: SectionKind) -> Result<Option<ConfigRecord>> {
            Err(SitecfgError::store_error("get_singleton", "down"))
        }
        async fn commit_update(
            &self,
            _kind: SectionKind,
            _section: Section,
            _meta: WriteMeta,
        ) -> Result<CommittedWrite> {
            Err(SitecfgError::store_error("commit_update", "down"))
        }
        async fn delete(&self, _kind: SectionKind) -> Result<()> {
            Err(SitecfgError::store_error("delete", "down"))
        }
        async fn audit_history(
            &self,
            _kind: SectionKind,
            _record_id: RecordId,
            _limit: usize,
        ) -> Result<Vec<AuditEntry>> {
            Ok(Vec::new())
        }
        async fn audit_by_actor(&self, _actor: &Actor, _limit: usize) -> Result<Vec<AuditEntry>> {
            Ok(Vec::new())
        }
        async fn list_versions(
            &self,
            _kind: SectionKind,
            _record_id: RecordId,
        ) -> Result<Vec<ConfigVersion>> {
            Ok(Vec::new())
        }
        async fn get_version(
            &self,
            _kind: SectionKind,
            _record_id: RecordId,
            _version_number: u32,
        ) -> Result<Option<ConfigVersion>> {
            Ok(None)
        }
        async fn ping(&self) -> Result<()> {
            Err(SitecfgError::store_error("ping", "down"))
        }
    }

    #[tokio::test]
    async fn test_healthy_when_all_probes_pass() {
        let report = checker(Arc::new(MemoryStore::new())).run_health_checks().await;

        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.checks.len(), 3);
        assert!(report.checks.iter().all(|c| c.duration_ms >= 0.0));
    }

    #[tokio::test]
    async fn test_dead_store_is_critical() {
        let report = checker(Arc::new(DeadStore)).run_health_checks().await;

        assert_eq!(report.status, HealthStatus::Critical);
        let store_check = report.checks.iter().find(|c| c.name == "store").unwrap();
        assert_eq!(store_check.status, HealthStatus::Critical);
        // The other probes still ran.
        let cache_check = report.checks.iter().find(|c| c.name == "cache").unwrap();
        assert_eq!(cache_check.status, HealthStatus::Healthy);
    }

    #[test]
    fn test_status_ordering_prefers_worst() {
        assert!(HealthStatus::Critical > HealthStatus::Warning);
        assert!(HealthStatus::Warning > HealthStatus::Healthy);
        assert!(HealthStatus::Unknown > HealthStatus::Critical);
    }
}

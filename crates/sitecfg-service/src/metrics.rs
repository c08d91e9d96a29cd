//! Service metrics.
//!
//! Recorders for the two hot paths this service has: cache traffic
//! (hits, misses, evictions, namespace flushes) and composite
//! resolution (outcome plus latency, with fallback serves counted
//! separately). Everything is emitted through the `metrics` facade;
//! the counts that tests and log lines read back are mirrored in
//! atomics so they work without a recorder installed.

use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Registra las descripciones de todas las metricas del servicio.
/// Llamar una vez al inicio.
pub fn register_metrics() {
    metrics::describe_counter!("sitecfg_cache_hits_total", "Total number of cache hits");
    metrics::describe_counter!("sitecfg_cache_misses_total", "Total number of cache misses");
    metrics::describe_counter!(
        "sitecfg_cache_evictions_total",
        "Total number of cache evictions"
    );
    metrics::describe_gauge!("sitecfg_cache_entries", "Current number of entries in cache");
    metrics::describe_histogram!(
        "sitecfg_cache_operation_seconds",
        "Time spent on cache operations"
    );
    metrics::describe_counter!(
        "sitecfg_cache_namespace_flush_total",
        "Entries removed by namespace invalidation"
    );
    metrics::describe_counter!(
        "sitecfg_resolve_total",
        "Composite resolutions by outcome"
    );
    metrics::describe_histogram!(
        "sitecfg_resolve_seconds",
        "Time spent resolving the composite configuration"
    );
}

/// Recorder del trafico de cache.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self {
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("sitecfg_cache_hits_total").increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("sitecfg_cache_misses_total").increment(1);
    }

    pub fn record_eviction(&self, reason: &str) {
        counter!("sitecfg_cache_evictions_total", "reason" => reason.to_string()).increment(1);
    }

    /// Entries removed by one namespace flush.
    pub fn record_namespace_flush(&self, namespace: &str, removed: u64) {
        counter!(
            "sitecfg_cache_namespace_flush_total",
            "namespace" => namespace.to_string()
        )
        .increment(removed);
    }

    pub fn update_entry_count(&self, count: u64) {
        gauge!("sitecfg_cache_entries").set(count as f64);
    }

    pub fn record_operation_duration(&self, operation: &str, duration: Duration) {
        histogram!(
            "sitecfg_cache_operation_seconds",
            "operation" => operation.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Hit rate para logging/debugging.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// How one `resolve()` call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Served from the composite cache.
    CacheHit,
    /// Assembled from fresh store reads.
    StoreLoad,
    /// Degraded to compiled-in defaults.
    Fallback,
}

impl ResolveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveOutcome::CacheHit => "cache_hit",
            ResolveOutcome::StoreLoad => "store_load",
            ResolveOutcome::Fallback => "fallback",
        }
    }
}

/// Recorder de resoluciones del composite.
///
/// Fallback serves get their own atomic mirror: a rising fallback count
/// is the clearest signal that the store is unhealthy.
#[derive(Debug, Clone)]
pub struct ResolverMetrics {
    fallbacks: Arc<AtomicU64>,
}

impl ResolverMetrics {
    pub fn new() -> Self {
        Self {
            fallbacks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registra una resolucion con su outcome y duracion.
    pub fn record(&self, outcome: ResolveOutcome, duration: Duration) {
        if outcome == ResolveOutcome::Fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
        }
        counter!("sitecfg_resolve_total", "outcome" => outcome.as_str()).increment(1);
        histogram!("sitecfg_resolve_seconds", "outcome" => outcome.as_str())
            .record(duration.as_secs_f64());
    }

    /// Total fallback serves since construction.
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }
}

impl Default for ResolverMetrics {
    fn default() -> Self {
        Self::new()
    }
}

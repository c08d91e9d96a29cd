//! Structured configuration cache using Moka.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde_json::Value;

use crate::cache::keys::CacheKey;
use crate::metrics::CacheMetrics;
use crate::settings::CacheSettings;

/// A cached value together with its per-entry TTL.
#[derive(Debug, Clone)]
pub(super) struct CacheEntry {
    value: Value,
    ttl: Duration,
}

/// Reads the TTL stored on each entry instead of a cache-wide one.
struct PerEntryExpiry;

impl Expiry<CacheKey, Arc<CacheEntry>> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Cache de configuraciones usando Moka.
/// Thread-safe y async-friendly.
///
/// All operations are infallible: the cache is in-process, so a lookup
/// either hits or misses but never errors. Callers that need a value on
/// miss go back to the resolver.
///
/// # Examples
///
/// ```no_run
/// use sitecfg_service::cache::{CacheKey, ConfigCache};
/// use sitecfg_service::settings::CacheSettings;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache = ConfigCache::new(CacheSettings::default());
/// let key = CacheKey::composite("v1");
///
/// cache.set(key.clone(), json!({"site_name": "Acme"}), None).await;
/// if let Some(value) = cache.get(&key).await {
///     println!("Cache hit: {value}");
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct ConfigCache {
    inner: Cache<CacheKey, Arc<CacheEntry>>,
    metrics: CacheMetrics,
    default_ttl: Duration,
    schema_version: String,
}

impl ConfigCache {
    /// Crea un nuevo cache con la configuracion dada.
    pub fn new(settings: CacheSettings) -> Self {
        let metrics = CacheMetrics::new();

        let eviction_metrics = metrics.clone();
        let inner = Cache::builder()
            .max_capacity(settings.max_capacity)
            .expire_after(PerEntryExpiry)
            .eviction_listener(move |_key, _value, cause| {
                let reason = match cause {
                    moka::notification::RemovalCause::Expired => "ttl",
                    moka::notification::RemovalCause::Size => "capacity",
                    moka::notification::RemovalCause::Explicit => "manual",
                    moka::notification::RemovalCause::Replaced => "replaced",
                };
                eviction_metrics.record_eviction(reason);
            })
            .build();

        Self {
            inner,
            metrics,
            default_ttl: settings.ttl(),
            schema_version: settings.schema_version,
        }
    }

    /// Schema version stamped into every key this cache builds.
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Obtiene un valor del cache si existe.
    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        let start = Instant::now();
        let result = self.inner.get(key).await;

        if result.is_some() {
            self.metrics.record_hit();
        } else {
            self.metrics.record_miss();
        }

        self.metrics
            .record_operation_duration("get", start.elapsed());
        self.update_entry_gauge();

        result.map(|entry| entry.value.clone())
    }

    /// Inserta un valor con el TTL dado (o el default del cache).
    pub async fn set(&self, key: CacheKey, value: Value, ttl: Option<Duration>) {
        let start = Instant::now();
        let entry = CacheEntry {
            value,
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        self.inner.insert(key, Arc::new(entry)).await;

        self.metrics
            .record_operation_duration("set", start.elapsed());
        self.update_entry_gauge();
    }

    /// Invalida una entrada especifica.
    pub async fn delete(&self, key: &CacheKey) {
        self.inner.invalidate(key).await;
        self.update_entry_gauge();
    }

    /// True when the key is currently cached, without touching metrics.
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.inner.contains_key(key)
    }

    /// Retorna el numero aproximado de entries en cache.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Retorna las metricas para acceso externo.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub(crate) fn update_entry_gauge(&self) {
        self.metrics.update_entry_count(self.inner.entry_count());
    }

    pub(super) fn inner(&self) -> &Cache<CacheKey, Arc<CacheEntry>> {
        &self.inner
    }

    /// Sincroniza el cache (para tests principalmente).
    /// Fuerza la limpieza de entries expiradas.
    #[cfg(test)]
    pub(crate) async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }
}

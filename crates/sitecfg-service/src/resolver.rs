//! Composite configuration resolution.
//!
//! The resolver assembles the four section kinds into one
//! [`CompositeConfig`]. It never surfaces an error to callers: a store
//! that is slow, down or corrupt degrades the result to compiled-in
//! defaults so rendering paths always have a usable configuration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use sitecfg_core::{
    CompositeConfig, Result, Section, SectionKind, SitecfgError, validate_section,
};
use sitecfg_store::ConfigStore;

use crate::cache::{CacheKey, ConfigCache};
use crate::metrics::{ResolveOutcome, ResolverMetrics};

/// Resolves the composite configuration from the store, with a cache in
/// front of it.
#[derive(Clone)]
pub struct ConfigResolver {
    store: Arc<dyn ConfigStore>,
    cache: ConfigCache,
    store_timeout: Duration,
    metrics: ResolverMetrics,
}

impl ConfigResolver {
    pub fn new(store: Arc<dyn ConfigStore>, cache: ConfigCache, store_timeout: Duration) -> Self {
        Self {
            store,
            cache,
            store_timeout,
            metrics: ResolverMetrics::new(),
        }
    }

    /// Resolution metrics for external inspection.
    pub fn metrics(&self) -> &ResolverMetrics {
        &self.metrics
    }

    /// Resolves the full composite configuration.
    ///
    /// With `use_cache`, a cached composite is returned as-is; on miss
    /// the store is read and the result cached. Infallible: store
    /// failures degrade to [`CompositeConfig::fallback`], which is never
    /// cached so the next call retries the store.
    pub async fn resolve(&self, use_cache: bool) -> CompositeConfig {
        let start = Instant::now();
        let key = CacheKey::composite(self.cache.schema_version());

        if use_cache {
            if let Some(cached) = self.cache.get(&key).await {
                match serde_json::from_value::<CompositeConfig>(cached) {
                    Ok(composite) => {
                        debug!("composite config served from cache");
                        self.metrics.record(ResolveOutcome::CacheHit, start.elapsed());
                        return composite;
                    }
                    Err(e) => {
                        // A stale shape from an older build; drop it and
                        // fall through to a fresh load.
                        warn!(error = %e, "cached composite failed to deserialize");
                        self.cache.delete(&key).await;
                    }
                }
            }
        }

        match self.load_fresh().await {
            Ok(composite) => {
                match serde_json::to_value(&composite) {
                    Ok(value) => self.cache.set(key, value, None).await,
                    Err(e) => warn!(error = %e, "composite config not cacheable"),
                }
                self.metrics.record(ResolveOutcome::StoreLoad, start.elapsed());
                composite
            }
            Err(e) => {
                warn!(error = %e, "config resolution failed, serving fallback defaults");
                self.metrics.record(ResolveOutcome::Fallback, start.elapsed());
                CompositeConfig::fallback()
            }
        }
    }

    /// Reads all four sections from the store concurrently.
    async fn load_fresh(&self) -> Result<CompositeConfig> {
        let (site, seo, theme, content) = tokio::join!(
            self.load_section(SectionKind::Site),
            self.load_section(SectionKind::Seo),
            self.load_section(SectionKind::Theme),
            self.load_section(SectionKind::Content),
        );

        Ok(CompositeConfig::new(
            site?.into_site().unwrap_or_default(),
            seo?.into_seo().unwrap_or_default(),
            theme?.into_theme().unwrap_or_default(),
            content?.into_content().unwrap_or_default(),
        ))
    }

    /// Reads one section, re-validating the stored payload. A missing
    /// record or a payload that no longer validates yields the section's
    /// defaults; only store-level failures propagate.
    async fn load_section(&self, kind: SectionKind) -> Result<Section> {
        let record = tokio::time::timeout(self.store_timeout, self.store.get_singleton(kind))
            .await
            .map_err(|_| {
                SitecfgError::store_error(
                    "get_singleton",
                    format!("store read for {kind} timed out"),
                )
            })??;

        let Some(record) = record else {
            debug!(kind = %kind, "no stored record, using defaults");
            return Ok(Section::default_for(kind));
        };

        let raw: Value = record.section.fields_value()?;
        match validate_section(kind, &raw) {
            Ok(section) => Ok(section),
            Err(errors) => {
                warn!(
                    kind = %kind,
                    errors = errors.len(),
                    "stored section failed validation, using defaults"
                );
                Ok(Section::default_for(kind))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CacheSettings;
    use async_trait::async_trait;
    use sitecfg_core::{Actor, RecordId, SiteSection};
    use sitecfg_store::{
        AuditEntry, CommittedWrite, ConfigRecord, ConfigVersion, MemoryStore, WriteMeta,
    };

    fn resolver_over(store: Arc<dyn ConfigStore>) -> ConfigResolver {
        ConfigResolver::new(
            store,
            ConfigCache::new(CacheSettings::default()),
            Duration::from_millis(500),
        )
    }

    /// Store that fails every read.
    struct BrokenStore;

    #[async_trait]
    impl ConfigStore for BrokenStore {
        async fn get_singleton(&self, _kind: SectionKind) -> Result<Option<ConfigRecord>> {
            Err(SitecfgError::store_error("get_singleton", "backend down"))
        }
        async fn commit_update(
            &self,
            _kind: SectionKind,
            _section: Section,
            _meta: WriteMeta,
        ) -> Result<CommittedWrite> {
            Err(SitecfgError::store_error("commit_update", "backend down"))
        }
        async fn delete(&self, _kind: SectionKind) -> Result<()> {
            Err(SitecfgError::store_error("delete", "backend down"))
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
            Err(SitecfgError::store_error("ping", "backend down"))
        }
    }

    #[tokio::test]
    async fn test_empty_store_resolves_to_defaults() {
        let resolver = resolver_over(Arc::new(MemoryStore::new()));

        let composite = resolver.resolve(false).await;

        assert_eq!(composite.site.site_name, "My Site");
        assert!(!composite.content.maintenance_mode);
    }

    #[tokio::test]
    async fn test_stored_section_is_resolved() {
        let store = Arc::new(MemoryStore::new());
        store
            .commit_update(
                SectionKind::Site,
                Section::Site(SiteSection {
                    site_name: "Acme".into(),
                    ..SiteSection::default()
                }),
                WriteMeta::recorded(Actor::system(), None),
            )
            .await
            .unwrap();

        let resolver = resolver_over(store);
        let composite = resolver.resolve(false).await;

        assert_eq!(composite.site.site_name, "Acme");
    }

    #[tokio::test]
    async fn test_broken_store_yields_fallback() {
        let resolver = resolver_over(Arc::new(BrokenStore));

        let composite = resolver.resolve(true).await;

        assert_eq!(composite.site.site_name, "My Site");
        // Fallback never reaches the cache, the next call retries.
        let again = resolver.resolve(true).await;
        assert_eq!(again.site.site_name, "My Site");
        // Every degraded serve is counted.
        assert_eq!(resolver.metrics().fallbacks(), 2);
    }

    #[tokio::test]
    async fn test_healthy_resolves_count_no_fallbacks() {
        let resolver = resolver_over(Arc::new(MemoryStore::new()));

        resolver.resolve(true).await;
        resolver.resolve(true).await;

        assert_eq!(resolver.metrics().fallbacks(), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver_over(store.clone());

        let first = resolver.resolve(true).await;
        // Overwrite the store; a cached resolve must not see it.
        store
            .commit_update(
                SectionKind::Site,
                Section::Site(SiteSection {
                    site_name: "Changed".into(),
                    ..SiteSection::default()
                }),
                WriteMeta::recorded(Actor::system(), None),
            )
            .await
            .unwrap();

        let cached = resolver.resolve(true).await;
        assert_eq!(cached.site.site_name, first.site.site_name);

        let fresh = resolver.resolve(false).await;
        assert_eq!(fresh.site.site_name, "Changed");
    }
}

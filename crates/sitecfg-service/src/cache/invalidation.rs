//! Namespace-scoped cache invalidation.
//!
//! The key space is closed (see [`super::keys::RESOURCES`]), so a
//! namespace flush enumerates the keys the namespace can contain and
//! removes the ones that are present. Deterministic and allocation-light;
//! no pattern matching involved.

use tracing::info;

use crate::cache::keys::{CacheNamespace, derive_namespace_keys};
use crate::cache::ConfigCache;

/// Resultado de una operacion de invalidacion.
#[derive(Debug, Clone)]
pub struct InvalidationResult {
    /// Numero de entries invalidadas.
    pub count: usize,
    /// Namespaces tocados.
    pub namespaces: Vec<CacheNamespace>,
}

impl ConfigCache {
    /// Invalida todas las entradas de un namespace.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use sitecfg_service::cache::{CacheNamespace, ConfigCache};
    /// # use sitecfg_service::settings::CacheSettings;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let cache = ConfigCache::new(CacheSettings::default());
    /// let result = cache.invalidate_namespace(CacheNamespace::Core).await;
    /// println!("Invalidated {} entries", result.count);
    /// # }
    /// ```
    pub async fn invalidate_namespace(&self, namespace: CacheNamespace) -> InvalidationResult {
        let mut count = 0;
        for key in derive_namespace_keys(namespace, self.schema_version()) {
            if self.contains_key(&key) {
                self.inner().invalidate(&key).await;
                count += 1;
            }
        }
        self.update_entry_gauge();
        self.metrics()
            .record_namespace_flush(namespace.as_str(), count as u64);

        info!(namespace = %namespace, count, "cache namespace invalidated");

        InvalidationResult {
            count,
            namespaces: vec![namespace],
        }
    }

    /// Invalida todos los namespaces conocidos.
    pub async fn invalidate_all_namespaces(&self) -> InvalidationResult {
        let mut count = 0;
        for namespace in CacheNamespace::ALL {
            count += self.invalidate_namespace(namespace).await.count;
        }

        InvalidationResult {
            count,
            namespaces: CacheNamespace::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::CacheKey;
    use crate::settings::CacheSettings;
    use serde_json::json;
    use sitecfg_core::SectionKind;

    async fn populated_cache() -> ConfigCache {
        let cache = ConfigCache::new(CacheSettings::default());
        cache.set(CacheKey::composite("v1"), json!({"a": 1}), None).await;
        cache
            .set(CacheKey::feature_flags("v1"), json!({"beta": true}), None)
            .await;
        cache
            .set(
                CacheKey::section(SectionKind::Seo, "v1"),
                json!({"meta_title": "t"}),
                None,
            )
            .await;
        cache.sync().await;
        cache
    }

    #[tokio::test]
    async fn test_namespace_invalidation_is_scoped() {
        let cache = populated_cache().await;

        let result = cache.invalidate_namespace(CacheNamespace::Core).await;
        cache.sync().await;

        assert_eq!(result.count, 1);
        assert!(cache.get(&CacheKey::composite("v1")).await.is_none());
        // Other namespaces survive.
        assert!(cache.get(&CacheKey::feature_flags("v1")).await.is_some());
        assert!(
            cache
                .get(&CacheKey::section(SectionKind::Seo, "v1"))
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_invalidate_all_namespaces() {
        let cache = populated_cache().await;

        let result = cache.invalidate_all_namespaces().await;
        cache.sync().await;

        assert_eq!(result.count, 3);
        assert_eq!(result.namespaces.len(), 4);
        assert!(cache.get(&CacheKey::composite("v1")).await.is_none());
        assert!(cache.get(&CacheKey::feature_flags("v1")).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_namespace_counts_zero() {
        let cache = ConfigCache::new(CacheSettings::default());

        let result = cache.invalidate_namespace(CacheNamespace::SiteData).await;

        assert_eq!(result.count, 0);
    }
}

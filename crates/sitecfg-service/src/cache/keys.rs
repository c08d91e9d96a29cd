//! Cache key generation and normalization.
//!
//! Keys follow the `namespace:resource:state:schema_version` layout so
//! every cacheable artifact has exactly one deterministic address. The
//! namespace catalog is closed, which is what makes namespace-wide
//! invalidation enumerable instead of pattern-based.

use std::fmt;

use sitecfg_core::SectionKind;

/// Closed catalog of cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Resolved composites and other hot-path artifacts.
    Core,
    /// Raw per-section payloads.
    Config,
    /// Feature flag lookups.
    FeatureFlags,
    /// Derived site data (navigation, rendered fragments).
    SiteData,
}

impl CacheNamespace {
    /// Every namespace, in invalidation order.
    pub const ALL: [CacheNamespace; 4] = [
        CacheNamespace::Core,
        CacheNamespace::Config,
        CacheNamespace::FeatureFlags,
        CacheNamespace::SiteData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Core => "core",
            CacheNamespace::Config => "config",
            CacheNamespace::FeatureFlags => "feature_flags",
            CacheNamespace::SiteData => "site_data",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing state of a cached artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheState {
    /// As stored, before validation.
    Raw,
    /// Assembled from store reads.
    Resolved,
    /// Passed schema validation.
    Validated,
    /// Post-processed for consumption.
    Processed,
}

impl CacheState {
    pub const ALL: [CacheState; 4] = [
        CacheState::Raw,
        CacheState::Resolved,
        CacheState::Validated,
        CacheState::Processed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheState::Raw => "raw",
            CacheState::Resolved => "resolved",
            CacheState::Validated => "validated",
            CacheState::Processed => "processed",
        }
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource names that may appear in cache keys.
///
/// Namespace invalidation enumerates this list crossed with every
/// [`CacheState`], so any key the service writes must use one of these.
pub const RESOURCES: [&str; 7] = [
    "site_config",
    "feature_flags",
    "site",
    "seo",
    "theme",
    "content",
    "health_probe",
];

/// Key unica para el cache de configuracion.
/// Normaliza el resource a lowercase para consistencia.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: CacheNamespace,
    resource: String,
    state: CacheState,
    schema_version: String,
}

impl CacheKey {
    /// Creates a new cache key, normalizing the resource to lowercase.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitecfg_service::cache::{CacheKey, CacheNamespace, CacheState};
    ///
    /// let key = CacheKey::new(CacheNamespace::Core, "Site_Config", CacheState::Resolved, "v1");
    /// assert_eq!(key.to_string(), "core:site_config:resolved:v1");
    /// ```
    pub fn new(
        namespace: CacheNamespace,
        resource: impl Into<String>,
        state: CacheState,
        schema_version: impl Into<String>,
    ) -> Self {
        Self {
            namespace,
            resource: resource.into().to_lowercase(),
            state,
            schema_version: schema_version.into(),
        }
    }

    /// The key for the resolved composite configuration.
    pub fn composite(schema_version: &str) -> Self {
        Self::new(
            CacheNamespace::Core,
            "site_config",
            CacheState::Resolved,
            schema_version,
        )
    }

    /// The key for processed feature flag lookups.
    pub fn feature_flags(schema_version: &str) -> Self {
        Self::new(
            CacheNamespace::FeatureFlags,
            "feature_flags",
            CacheState::Processed,
            schema_version,
        )
    }

    /// The key the health checker round-trips through the cache.
    pub fn health_probe(schema_version: &str) -> Self {
        Self::new(
            CacheNamespace::SiteData,
            "health_probe",
            CacheState::Processed,
            schema_version,
        )
    }

    /// The key for one section's raw payload.
    pub fn section(kind: SectionKind, schema_version: &str) -> Self {
        Self::new(
            CacheNamespace::Config,
            kind.as_str(),
            CacheState::Raw,
            schema_version,
        )
    }

    pub fn namespace(&self) -> CacheNamespace {
        self.namespace
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn state(&self) -> CacheState {
        self.state
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.namespace, self.resource, self.state, self.schema_version
        )
    }
}

/// Every key a namespace can contain: [`RESOURCES`] crossed with every
/// state. Invalidation walks this set instead of matching patterns.
pub fn derive_namespace_keys(namespace: CacheNamespace, schema_version: &str) -> Vec<CacheKey> {
    let mut keys = Vec::with_capacity(RESOURCES.len() * CacheState::ALL.len());
    for resource in RESOURCES {
        for state in CacheState::ALL {
            keys.push(CacheKey::new(namespace, resource, state, schema_version));
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        let key = CacheKey::new(
            CacheNamespace::Config,
            "seo",
            CacheState::Raw,
            "v1",
        );

        assert_eq!(key.to_string(), "config:seo:raw:v1");
    }

    #[test]
    fn test_cache_key_normalization() {
        let key1 = CacheKey::new(CacheNamespace::Core, "Site_Config", CacheState::Resolved, "v1");
        let key2 = CacheKey::new(CacheNamespace::Core, "site_config", CacheState::Resolved, "v1");

        assert_eq!(key1, key2);
    }

    #[test]
    fn test_cache_key_hash() {
        use std::collections::HashSet;

        let key1 = CacheKey::composite("v1");
        let key2 = CacheKey::new(
            CacheNamespace::Core,
            "SITE_CONFIG",
            CacheState::Resolved,
            "v1",
        );

        let mut set = HashSet::new();
        set.insert(key1);

        // key2 debe ser considerada igual a key1
        assert!(set.contains(&key2));
    }

    #[test]
    fn test_schema_version_partitions_keys() {
        let v1 = CacheKey::composite("v1");
        let v2 = CacheKey::composite("v2");

        assert_ne!(v1, v2);
    }

    #[test]
    fn test_derived_keys_cover_well_known_keys() {
        let core = derive_namespace_keys(CacheNamespace::Core, "v1");
        assert_eq!(core.len(), RESOURCES.len() * CacheState::ALL.len());
        assert!(core.contains(&CacheKey::composite("v1")));

        let flags = derive_namespace_keys(CacheNamespace::FeatureFlags, "v1");
        assert!(flags.contains(&CacheKey::feature_flags("v1")));

        let config = derive_namespace_keys(CacheNamespace::Config, "v1");
        assert!(config.contains(&CacheKey::section(SectionKind::Seo, "v1")));

        // The probe key must stay enumerable, or a SiteData flush would
        // miss it.
        let site_data = derive_namespace_keys(CacheNamespace::SiteData, "v1");
        assert!(site_data.contains(&CacheKey::health_probe("v1")));
    }
}

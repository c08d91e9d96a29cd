//! The configuration service facade.
//!
//! Wires the resolver, cache, tracker, history and health components
//! over one store and exposes the operations embedders call. All
//! collaborators are injected; nothing here is process-global.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use sitecfg_core::{
    Actor, CompositeConfig, Result, SectionKind, SitecfgError, ValidationReport, validate,
    validate_section,
};
use sitecfg_store::{AuditEntry, CommittedWrite, ConfigStore, ConfigVersion, WriteMeta};

use crate::cache::{CacheKey, CacheNamespace, ConfigCache};
use crate::health::{HealthChecker, HealthReport};
use crate::history::ConfigHistory;
use crate::resolver::ConfigResolver;
use crate::settings::ServiceSettings;
use crate::tracker::{CacheInvalidationHandler, ChangeEvent, ChangeHandler, ChangeTracker};
use crate::transfer::{ConfigSnapshot, ConfigTransfer, ExportScope, ImportOutcome};

/// What a cache invalidation request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationScope {
    /// Every namespace.
    All,
    /// Namespaces affected by one section kind.
    Section(SectionKind),
}

/// The assembled configuration service.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sitecfg_service::{ConfigService, ServiceSettings};
/// use sitecfg_store::MemoryStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let service = ConfigService::new(Arc::new(MemoryStore::new()), ServiceSettings::default());
/// let config = service.resolve_config(true).await;
/// println!("serving {}", config.site.site_name);
/// # }
/// ```
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    cache: ConfigCache,
    resolver: ConfigResolver,
    tracker: ChangeTracker,
    history: ConfigHistory,
    health: HealthChecker,
    transfer: ConfigTransfer,
}

impl ConfigService {
    /// Builds the service over a store, wiring cache invalidation into
    /// the change tracker. Must be called from within a Tokio runtime
    /// (the tracker spawns its notification worker here).
    pub fn new(store: Arc<dyn ConfigStore>, settings: ServiceSettings) -> Self {
        let cache = ConfigCache::new(settings.cache.clone());
        let resolver = ConfigResolver::new(store.clone(), cache.clone(), settings.store_timeout());
        let tracker = ChangeTracker::new(settings.tracker.clone());
        tracker.register_handler(Arc::new(CacheInvalidationHandler::new(cache.clone())));

        let history = ConfigHistory::new(store.clone());
        let health = HealthChecker::new(store.clone(), cache.clone(), &settings.health);
        let transfer = ConfigTransfer::new(store.clone());

        Self {
            store,
            cache,
            resolver,
            tracker,
            history,
            health,
            transfer,
        }
    }

    /// The cache backing this service.
    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }

    /// Resolves the composite configuration. Infallible.
    pub async fn resolve_config(&self, use_cache: bool) -> CompositeConfig {
        self.resolver.resolve(use_cache).await
    }

    /// Validates and commits one section write, then notifies handlers.
    ///
    /// The raw payload is validated first; a payload with errors is
    /// rejected before anything reaches the store.
    pub async fn update_section(
        &self,
        kind: SectionKind,
        raw: &Value,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<CommittedWrite> {
        let section = validate_section(kind, raw).map_err(SitecfgError::validation_failed)?;

        let committed = self
            .store
            .commit_update(kind, section, WriteMeta::recorded(actor, reason))
            .await?;

        info!(
            kind = %kind,
            action = %committed.audit.action,
            actor = %committed.audit.actor,
            "configuration section updated"
        );

        self.tracker
            .record_change(ChangeEvent {
                kind,
                record_id: committed.record.id,
                action: committed.audit.action,
                timestamp: committed.audit.timestamp,
                changed_fields: committed.audit.changed_fields(),
            })
            .await;

        Ok(committed)
    }

    /// Validates a raw payload without writing anything.
    pub fn validate(&self, kind: SectionKind, raw: &Value) -> ValidationReport {
        validate(kind, raw)
    }

    /// Looks up one feature flag, serving from the flag cache when warm.
    pub async fn get_feature_flag(&self, name: &str, default: bool) -> bool {
        let key = CacheKey::feature_flags(self.cache.schema_version());

        if let Some(cached) = self.cache.get(&key).await {
            if let Some(flag) = cached.get(name).and_then(Value::as_bool) {
                return flag;
            }
            // A flag absent from the cached map is absent everywhere.
            if cached.is_object() {
                return default;
            }
        }

        let composite = self.resolve_config(true).await;
        match serde_json::to_value(&composite.site.feature_flags) {
            Ok(flags) => self.cache.set(key, flags, None).await,
            Err(e) => warn!(error = %e, "feature flags not cacheable"),
        }
        composite.feature_flag(name, default)
    }

    /// Flushes cached configuration for the given scope.
    pub async fn invalidate_cache(&self, scope: InvalidationScope) -> usize {
        match scope {
            InvalidationScope::All => self.cache.invalidate_all_namespaces().await.count,
            InvalidationScope::Section(kind) => {
                let mut count = self
                    .cache
                    .invalidate_namespace(CacheNamespace::Core)
                    .await
                    .count;
                count += self
                    .cache
                    .invalidate_namespace(CacheNamespace::Config)
                    .await
                    .count;
                if kind == SectionKind::Site {
                    count += self
                        .cache
                        .invalidate_namespace(CacheNamespace::FeatureFlags)
                        .await
                        .count;
                }
                count
            }
        }
    }

    /// Audit entries for one section's record, newest first.
    pub async fn get_history(&self, kind: SectionKind, limit: usize) -> Result<Vec<AuditEntry>> {
        self.history
            .get_history(kind, sitecfg_core::SINGLETON_RECORD_ID, limit)
            .await
    }

    /// All versions of one section's record, newest first.
    pub async fn list_versions(&self, kind: SectionKind) -> Result<Vec<ConfigVersion>> {
        self.history
            .list_versions(kind, sitecfg_core::SINGLETON_RECORD_ID)
            .await
    }

    /// Rolls back one section to an earlier version.
    ///
    /// Returns `true` on success. Failures are logged and reported as
    /// `false` so calling surfaces can branch without an error taxonomy.
    pub async fn rollback(&self, kind: SectionKind, version_number: u32, actor: Actor) -> bool {
        let committed = match self
            .history
            .rollback_to(kind, sitecfg_core::SINGLETON_RECORD_ID, version_number, actor)
            .await
        {
            Ok(committed) => committed,
            Err(e) => {
                warn!(kind = %kind, version = version_number, error = %e, "rollback failed");
                return false;
            }
        };

        self.tracker
            .record_change(ChangeEvent {
                kind,
                record_id: committed.record.id,
                action: committed.audit.action,
                timestamp: committed.audit.timestamp,
                changed_fields: committed.audit.changed_fields(),
            })
            .await;

        true
    }

    /// Recent change events, newest first.
    pub fn recent_changes(&self, limit: usize) -> Vec<ChangeEvent> {
        self.tracker.recent_changes(limit)
    }

    /// Change events since the given instant, newest first.
    pub fn changes_since(&self, since: chrono::DateTime<Utc>) -> Vec<ChangeEvent> {
        self.tracker.changes_since(since)
    }

    /// Registers an inline change handler.
    pub fn register_change_handler(&self, handler: Arc<dyn ChangeHandler>) {
        self.tracker.register_handler(handler);
    }

    /// Registers an async change handler serviced by the worker.
    pub fn register_async_change_handler(&self, handler: Arc<dyn ChangeHandler>) {
        self.tracker.register_async_handler(handler);
    }

    /// Exports the live configuration in scope.
    pub async fn export(&self, scope: ExportScope) -> Result<ConfigSnapshot> {
        self.transfer.export(scope).await
    }

    /// Imports a snapshot; see [`ConfigTransfer::import`].
    pub async fn import(
        &self,
        snapshot: &ConfigSnapshot,
        actor: Actor,
        dry_run: bool,
    ) -> Result<ImportOutcome> {
        let outcome = self.transfer.import(snapshot, actor, dry_run).await?;

        // Events carry each commit's real action and field diff, same as
        // a direct update.
        for committed in &outcome.commits {
            self.tracker
                .record_change(ChangeEvent {
                    kind: committed.record.kind,
                    record_id: committed.record.id,
                    action: committed.audit.action,
                    timestamp: committed.audit.timestamp,
                    changed_fields: committed.audit.changed_fields(),
                })
                .await;
        }

        Ok(outcome)
    }

    /// Runs all health probes.
    pub async fn run_health_checks(&self) -> HealthReport {
        self.health.run_health_checks().await
    }

    /// Drains the notification worker. Call once before process exit.
    pub async fn shutdown(&self) {
        self.tracker.shutdown().await;
    }
}

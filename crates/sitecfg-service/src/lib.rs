//! Sitecfg Service - resolution, caching, tracking, history and health
//!
//! The service layer over a [`sitecfg_store::ConfigStore`]: the
//! composite resolver with its structured cache, namespace-scoped
//! invalidation, change tracking with handler fan-out, audit/version
//! history with rollback, export/import, and health checks. The
//! [`ConfigService`] facade wires it all together.

pub mod cache;
pub mod health;
pub mod history;
pub mod metrics;
pub mod resolver;
pub mod service;
pub mod settings;
pub mod tracker;
pub mod transfer;

// Re-exports
pub use cache::{CacheKey, CacheNamespace, CacheState, ConfigCache, InvalidationResult};
pub use health::{HealthCheck, HealthChecker, HealthReport, HealthStatus};
pub use history::ConfigHistory;
pub use metrics::{CacheMetrics, ResolveOutcome, ResolverMetrics, register_metrics};
pub use resolver::ConfigResolver;
pub use service::{ConfigService, InvalidationScope};
pub use settings::{CacheSettings, HealthSettings, ServiceSettings, TrackerSettings};
pub use tracker::{CacheInvalidationHandler, ChangeEvent, ChangeHandler, ChangeTracker};
pub use transfer::{ConfigSnapshot, ConfigTransfer, ExportScope, ImportOutcome};

// Re-export the lower layers so embedders get one import surface.
pub use sitecfg_core;
pub use sitecfg_store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

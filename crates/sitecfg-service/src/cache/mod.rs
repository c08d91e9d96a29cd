//! Structured cache layer: keys, the Moka-backed cache, and
//! namespace-scoped invalidation.

mod config_cache;
mod invalidation;
mod keys;

pub use config_cache::ConfigCache;
pub use invalidation::InvalidationResult;
pub use keys::{CacheKey, CacheNamespace, CacheState, RESOURCES, derive_namespace_keys};

//! Sitecfg Store - Record persistence seam
//!
//! Defines the [`ConfigStore`] trait the configuration service talks
//! to, the durable record/audit/version types it exchanges, and an
//! in-memory reference implementation used by tests and single-process
//! embedders.

pub mod memory;
pub mod record;
pub mod traits;

// Re-exports
pub use memory::MemoryStore;
pub use record::{
    AuditEntry, CommittedWrite, ConfigRecord, ConfigVersion, VersionAction, WriteMeta,
};
pub use traits::ConfigStore;

// Re-export the core crate so downstream users get one import surface.
pub use sitecfg_core;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

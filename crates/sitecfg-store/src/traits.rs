//! The record store seam.
//!
//! The persistence layer proper is an external collaborator; this trait
//! is the full contract the configuration service consumes. Any backend
//! (relational, document, in-memory) can sit behind it as long as it
//! honors the singleton and single-current-version invariants.

use async_trait::async_trait;

use sitecfg_core::{Actor, RecordId, Result, Section, SectionKind};

use crate::record::{AuditEntry, CommittedWrite, ConfigRecord, ConfigVersion, WriteMeta};

/// Abstraction over the durable configuration record store.
///
/// Implementations must be thread-safe; `resolve()` callers hit
/// `get_singleton` concurrently with no ordering guarantee.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Reads the live record for a section kind.
    ///
    /// # Errors
    ///
    /// - `SitecfgError::Store` if the backend is unreachable or corrupt
    async fn get_singleton(&self, kind: SectionKind) -> Result<Option<ConfigRecord>>;

    /// Applies one write as a single atomic transaction: upsert the live
    /// record (collapsing onto the singleton id), append an audit entry
    /// with old/new snapshots, and apply the requested version action
    /// (create-and-demote or restore-and-remark).
    ///
    /// Partial writes are not tolerated: on any error nothing is
    /// committed, and the single-current-version invariant holds on
    /// every return path.
    ///
    /// # Errors
    ///
    /// - `SitecfgError::Store` if the backend rejects the transaction
    /// - `SitecfgError::VersionNotFound` if a restore targets a missing version
    async fn commit_update(
        &self,
        kind: SectionKind,
        section: Section,
        meta: WriteMeta,
    ) -> Result<CommittedWrite>;

    /// Deleting a singleton is rejected; the invariant is one live
    /// record per kind at all times.
    ///
    /// # Errors
    ///
    /// - `SitecfgError::SingletonViolation` always
    async fn delete(&self, kind: SectionKind) -> Result<()>;

    /// Audit entries for one record, newest first.
    async fn audit_history(
        &self,
        kind: SectionKind,
        record_id: RecordId,
        limit: usize,
    ) -> Result<Vec<AuditEntry>>;

    /// Audit entries across all records for one actor, newest first.
    async fn audit_by_actor(&self, actor: &Actor, limit: usize) -> Result<Vec<AuditEntry>>;

    /// All versions for one record, descending by version number.
    async fn list_versions(
        &self,
        kind: SectionKind,
        record_id: RecordId,
    ) -> Result<Vec<ConfigVersion>>;

    /// One specific version, if it exists.
    async fn get_version(
        &self,
        kind: SectionKind,
        record_id: RecordId,
        version_number: u32,
    ) -> Result<Option<ConfigVersion>>;

    /// Cheap reachability probe used by health checks.
    async fn ping(&self) -> Result<()>;
}

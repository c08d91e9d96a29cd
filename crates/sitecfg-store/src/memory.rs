//! In-memory reference implementation of [`ConfigStore`].
//!
//! Used by tests and single-process embedders. Every operation takes
//! the inner lock once, so each trait call is one atomic transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use sitecfg_core::{
    Actor, ChangeAction, RecordId, Result, SCHEMA_VERSION, Section, SectionKind, SitecfgError,
    SINGLETON_RECORD_ID,
};

use crate::record::{
    AuditEntry, CommittedWrite, ConfigRecord, ConfigVersion, VersionAction, WriteMeta,
};
use crate::traits::ConfigStore;

#[derive(Default)]
struct Inner {
    records: HashMap<SectionKind, ConfigRecord>,
    audit: Vec<AuditEntry>,
    versions: HashMap<SectionKind, Vec<ConfigVersion>>,
    audit_seq: u64,
}

/// Thread-safe in-memory store honoring every [`ConfigStore`] invariant.
///
/// # Example
///
/// ```
/// use sitecfg_store::{ConfigStore, MemoryStore, WriteMeta};
/// use sitecfg_core::{Actor, Section, SectionKind};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> sitecfg_core::Result<()> {
/// let store = MemoryStore::new();
/// let committed = store
///     .commit_update(
///         SectionKind::Site,
///         Section::default_for(SectionKind::Site),
///         WriteMeta::recorded(Actor::system(), None),
///     )
///     .await?;
/// assert_eq!(committed.record.id, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_singleton(&self, kind: SectionKind) -> Result<Option<ConfigRecord>> {
        Ok(self.inner.lock().records.get(&kind).cloned())
    }

    async fn commit_update(
        &self,
        kind: SectionKind,
        section: Section,
        meta: WriteMeta,
    ) -> Result<CommittedWrite> {
        if section.kind() != kind {
            return Err(SitecfgError::internal(format!(
                "section payload kind {} does not match record kind {}",
                section.kind(),
                kind
            )));
        }

        // Snapshots are serialized before the lock-held mutation so a
        // serialization failure commits nothing.
        let new_value = section.fields_value()?;

        let mut inner = self.inner.lock();
        let now = Utc::now();
        let old = inner.records.get(&kind).cloned();
        let old_value = match &old {
            Some(record) => Some(record.section.fields_value()?),
            None => None,
        };

        let action = meta.action.unwrap_or(if old.is_some() {
            ChangeAction::Update
        } else {
            ChangeAction::Create
        });

        let record = ConfigRecord {
            kind,
            // Attempts to create a second record collapse onto id 1.
            id: SINGLETON_RECORD_ID,
            section: section.clone(),
            created_at: old.as_ref().map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
        };

        let version = match meta.version {
            VersionAction::Record { summary } => {
                let rows = inner.versions.entry(kind).or_default();
                let next = rows.iter().map(|v| v.version_number).max().unwrap_or(0) + 1;
                for row in rows.iter_mut() {
                    row.is_current = false;
                }
                let version = ConfigVersion {
                    kind,
                    record_id: record.id,
                    version_number: next,
                    snapshot: section,
                    schema_version: SCHEMA_VERSION.to_string(),
                    created_by: meta.actor.clone(),
                    created_at: now,
                    is_current: true,
                    summary,
                };
                rows.push(version.clone());
                Some(version)
            }
            VersionAction::Restore { version_number } => {
                let rows = inner.versions.entry(kind).or_default();
                if !rows.iter().any(|v| v.version_number == version_number) {
                    // Nothing has been mutated yet; the transaction
                    // aborts cleanly.
                    return Err(SitecfgError::version_not_found(
                        kind,
                        record.id,
                        version_number,
                    ));
                }
                let mut restored = None;
                for row in rows.iter_mut() {
                    row.is_current = row.version_number == version_number;
                    if row.is_current {
                        restored = Some(row.clone());
                    }
                }
                restored
            }
            VersionAction::Skip => None,
        };

        inner.audit_seq += 1;
        let audit = AuditEntry {
            id: inner.audit_seq,
            kind,
            record_id: record.id,
            action,
            actor: meta.actor,
            timestamp: now,
            old_value,
            new_value: Some(new_value),
            reason: meta.reason,
        };
        inner.audit.push(audit.clone());
        inner.records.insert(kind, record.clone());

        debug!(kind = %kind, action = %action, "config record committed");

        Ok(CommittedWrite {
            record,
            audit,
            version,
        })
    }

    async fn delete(&self, kind: SectionKind) -> Result<()> {
        Err(SitecfgError::singleton_violation(
            kind,
            "singleton records cannot be deleted; edit the existing record instead",
        ))
    }

    async fn audit_history(
        &self,
        kind: SectionKind,
        record_id: RecordId,
        limit: usize,
    ) -> Result<Vec<AuditEntry>> {
        let inner = self.inner.lock();
        let mut entries: Vec<AuditEntry> = inner
            .audit
            .iter()
            .filter(|e| e.kind == kind && e.record_id == record_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn audit_by_actor(&self, actor: &Actor, limit: usize) -> Result<Vec<AuditEntry>> {
        let inner = self.inner.lock();
        let mut entries: Vec<AuditEntry> = inner
            .audit
            .iter()
            .filter(|e| &e.actor == actor)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn list_versions(
        &self,
        kind: SectionKind,
        record_id: RecordId,
    ) -> Result<Vec<ConfigVersion>> {
        let inner = self.inner.lock();
        let mut rows: Vec<ConfigVersion> = inner
            .versions
            .get(&kind)
            .map(|rows| {
                rows.iter()
                    .filter(|v| v.record_id == record_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(rows)
    }

    async fn get_version(
        &self,
        kind: SectionKind,
        record_id: RecordId,
        version_number: u32,
    ) -> Result<Option<ConfigVersion>> {
        let inner = self.inner.lock();
        Ok(inner.versions.get(&kind).and_then(|rows| {
            rows.iter()
                .find(|v| v.record_id == record_id && v.version_number == version_number)
                .cloned()
        }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecfg_core::SiteSection;

    fn site(name: &str) -> Section {
        Section::Site(SiteSection {
            site_name: name.to_string(),
            ..SiteSection::default()
        })
    }

    async fn write(store: &MemoryStore, name: &str) -> CommittedWrite {
        store
            .commit_update(
                SectionKind::Site,
                site(name),
                WriteMeta::recorded(Actor::new("tester"), None),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_writes_collapse_onto_singleton_id() {
        let store = MemoryStore::new();

        let first = write(&store, "Acme").await;
        let second = write(&store, "Acme Labs").await;

        assert_eq!(first.record.id, SINGLETON_RECORD_ID);
        assert_eq!(second.record.id, SINGLETON_RECORD_ID);
        assert_eq!(first.audit.action, ChangeAction::Create);
        assert_eq!(second.audit.action, ChangeAction::Update);

        let live = store.get_singleton(SectionKind::Site).await.unwrap().unwrap();
        assert_eq!(live.section, site("Acme Labs"));
    }

    #[tokio::test]
    async fn test_version_numbers_are_monotonic_with_one_current() {
        let store = MemoryStore::new();

        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let committed = write(&store, name).await;
            assert_eq!(
                committed.version.as_ref().unwrap().version_number,
                i as u32 + 1
            );

            let versions = store
                .list_versions(SectionKind::Site, SINGLETON_RECORD_ID)
                .await
                .unwrap();
            let current: Vec<_> = versions.iter().filter(|v| v.is_current).collect();
            assert_eq!(current.len(), 1, "exactly one current version after write");
            assert_eq!(current[0].version_number, i as u32 + 1);
        }
    }

    #[tokio::test]
    async fn test_restore_remarks_existing_version() {
        let store = MemoryStore::new();
        write(&store, "v1 name").await;
        write(&store, "v2 name").await;

        let committed = store
            .commit_update(
                SectionKind::Site,
                site("v1 name"),
                WriteMeta::rollback(Actor::new("ops"), 1),
            )
            .await
            .unwrap();

        assert_eq!(committed.audit.action, ChangeAction::Rollback);
        assert_eq!(committed.version.unwrap().version_number, 1);

        let versions = store
            .list_versions(SectionKind::Site, SINGLETON_RECORD_ID)
            .await
            .unwrap();
        // History stays append-only: both versions remain.
        assert_eq!(versions.len(), 2);
        assert!(versions.iter().find(|v| v.version_number == 1).unwrap().is_current);
        assert!(!versions.iter().find(|v| v.version_number == 2).unwrap().is_current);
    }

    #[tokio::test]
    async fn test_restore_of_missing_version_commits_nothing() {
        let store = MemoryStore::new();
        write(&store, "only").await;

        let result = store
            .commit_update(
                SectionKind::Site,
                site("ghost"),
                WriteMeta::rollback(Actor::new("ops"), 9),
            )
            .await;

        assert!(matches!(
            result,
            Err(SitecfgError::VersionNotFound { version_number: 9, .. })
        ));

        // The failed transaction left the live record untouched.
        let live = store.get_singleton(SectionKind::Site).await.unwrap().unwrap();
        assert_eq!(live.section, site("only"));
        let history = store
            .audit_history(SectionKind::Site, SINGLETON_RECORD_ID, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_rejected() {
        let store = MemoryStore::new();
        write(&store, "Acme").await;

        let result = store.delete(SectionKind::Site).await;
        assert!(matches!(
            result,
            Err(SitecfgError::SingletonViolation { .. })
        ));
        assert!(store.get_singleton(SectionKind::Site).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_audit_history_is_newest_first() {
        let store = MemoryStore::new();
        write(&store, "one").await;
        write(&store, "two").await;
        write(&store, "three").await;

        let history = store
            .audit_history(SectionKind::Site, SINGLETON_RECORD_ID, 2)
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        assert!(history[0].id > history[1].id);
        assert_eq!(history[0].new_value.as_ref().unwrap()["site_name"], "three");
    }

    #[tokio::test]
    async fn test_audit_by_actor() {
        let store = MemoryStore::new();
        write(&store, "from tester").await;
        store
            .commit_update(
                SectionKind::Theme,
                Section::default_for(SectionKind::Theme),
                WriteMeta::recorded(Actor::new("designer"), Some("new palette".into())),
            )
            .await
            .unwrap();

        let entries = store
            .audit_by_actor(&Actor::new("designer"), 10)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, SectionKind::Theme);
        assert_eq!(entries[0].reason.as_deref(), Some("new palette"));
    }

    #[tokio::test]
    async fn test_mismatched_section_kind_is_rejected() {
        let store = MemoryStore::new();

        let result = store
            .commit_update(
                SectionKind::Theme,
                site("wrong"),
                WriteMeta::recorded(Actor::system(), None),
            )
            .await;

        assert!(result.is_err());
    }
}

//! Audit history and version rollback.

use std::sync::Arc;

use tracing::info;

use sitecfg_core::{Actor, RecordId, Result, SectionKind, SitecfgError};
use sitecfg_store::{AuditEntry, CommittedWrite, ConfigStore, ConfigVersion, WriteMeta};

/// Read access to the audit trail plus the rollback operation.
#[derive(Clone)]
pub struct ConfigHistory {
    store: Arc<dyn ConfigStore>,
}

impl ConfigHistory {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Audit entries for one record, newest first.
    pub async fn get_history(
        &self,
        kind: SectionKind,
        record_id: RecordId,
        limit: usize,
    ) -> Result<Vec<AuditEntry>> {
        self.store.audit_history(kind, record_id, limit).await
    }

    /// Audit entries across all records for one actor, newest first.
    pub async fn history_by_actor(&self, actor: &Actor, limit: usize) -> Result<Vec<AuditEntry>> {
        self.store.audit_by_actor(actor, limit).await
    }

    /// All versions of one record, newest first.
    pub async fn list_versions(
        &self,
        kind: SectionKind,
        record_id: RecordId,
    ) -> Result<Vec<ConfigVersion>> {
        self.store.list_versions(kind, record_id).await
    }

    /// Restores the live record to an existing version.
    ///
    /// The target version's snapshot becomes the live payload, the
    /// version is re-marked current, and a rollback audit entry is
    /// appended. No new version row is created; history stays
    /// append-only and the target keeps its number.
    pub async fn rollback_to(
        &self,
        kind: SectionKind,
        record_id: RecordId,
        version_number: u32,
        actor: Actor,
    ) -> Result<CommittedWrite> {
        let version = self
            .store
            .get_version(kind, record_id, version_number)
            .await?
            .ok_or_else(|| SitecfgError::version_not_found(kind, record_id, version_number))?;

        if self.store.get_singleton(kind).await?.is_none() {
            return Err(SitecfgError::record_not_found(kind));
        }

        let committed = self
            .store
            .commit_update(kind, version.snapshot, WriteMeta::rollback(actor, version_number))
            .await?;

        info!(
            kind = %kind,
            version = version_number,
            actor = %committed.audit.actor,
            "configuration rolled back"
        );

        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecfg_core::{ChangeAction, SINGLETON_RECORD_ID, Section, SiteSection};
    use sitecfg_store::MemoryStore;

    fn site(name: &str) -> Section {
        Section::Site(SiteSection {
            site_name: name.to_string(),
            ..SiteSection::default()
        })
    }

    async fn seeded() -> (ConfigHistory, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for name in ["first", "second"] {
            store
                .commit_update(
                    SectionKind::Site,
                    site(name),
                    WriteMeta::recorded(Actor::new("editor"), Some(format!("set {name}"))),
                )
                .await
                .unwrap();
        }
        (ConfigHistory::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_rollback_restores_snapshot_and_audits() {
        let (history, store) = seeded().await;

        let committed = history
            .rollback_to(SectionKind::Site, SINGLETON_RECORD_ID, 1, Actor::new("ops"))
            .await
            .unwrap();

        assert_eq!(committed.record.section, site("first"));
        assert_eq!(committed.audit.action, ChangeAction::Rollback);

        let live = store.get_singleton(SectionKind::Site).await.unwrap().unwrap();
        assert_eq!(live.section, site("first"));

        let versions = history
            .list_versions(SectionKind::Site, SINGLETON_RECORD_ID)
            .await
            .unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions.iter().find(|v| v.version_number == 1).unwrap().is_current);
    }

    #[tokio::test]
    async fn test_rollback_to_missing_version() {
        let (history, _store) = seeded().await;

        let result = history
            .rollback_to(SectionKind::Site, SINGLETON_RECORD_ID, 42, Actor::new("ops"))
            .await;

        assert!(matches!(
            result,
            Err(SitecfgError::VersionNotFound { version_number: 42, .. })
        ));
    }

    #[tokio::test]
    async fn test_rollback_without_live_record() {
        let store = Arc::new(MemoryStore::new());
        let history = ConfigHistory::new(store);

        let result = history
            .rollback_to(SectionKind::Theme, SINGLETON_RECORD_ID, 1, Actor::new("ops"))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_history_queries_delegate_newest_first() {
        let (history, _store) = seeded().await;

        let entries = history
            .get_history(SectionKind::Site, SINGLETON_RECORD_ID, 10)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].reason.as_deref(), Some("set second"));

        let by_actor = history
            .history_by_actor(&Actor::new("editor"), 1)
            .await
            .unwrap();
        assert_eq!(by_actor.len(), 1);
    }
}

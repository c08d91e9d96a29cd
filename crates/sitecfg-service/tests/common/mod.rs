//! Shared test fixtures.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use sitecfg_service::sitecfg_core::{Actor, RecordId, Result, Section, SectionKind};
use sitecfg_service::sitecfg_store::{
    AuditEntry, CommittedWrite, ConfigRecord, ConfigStore, ConfigVersion, MemoryStore, WriteMeta,
};

/// Store wrapper counting singleton reads, for asserting cache behavior.
pub struct CountingStore {
    inner: MemoryStore,
    reads: AtomicU32,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            reads: AtomicU32::new(0),
        }
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for CountingStore {
    async fn get_singleton(&self, kind: SectionKind) -> Result<Option<ConfigRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_singleton(kind).await
    }

    async fn commit_update(
        &self,
        kind: SectionKind,
        section: Section,
        meta: WriteMeta,
    ) -> Result<CommittedWrite> {
        self.inner.commit_update(kind, section, meta).await
    }

    async fn delete(&self, kind: SectionKind) -> Result<()> {
        self.inner.delete(kind).await
    }

    async fn audit_history(
        &self,
        kind: SectionKind,
        record_id: RecordId,
        limit: usize,
    ) -> Result<Vec<AuditEntry>> {
        self.inner.audit_history(kind, record_id, limit).await
    }

    async fn audit_by_actor(&self, actor: &Actor, limit: usize) -> Result<Vec<AuditEntry>> {
        self.inner.audit_by_actor(actor, limit).await
    }

    async fn list_versions(
        &self,
        kind: SectionKind,
        record_id: RecordId,
    ) -> Result<Vec<ConfigVersion>> {
        self.inner.list_versions(kind, record_id).await
    }

    async fn get_version(
        &self,
        kind: SectionKind,
        record_id: RecordId,
        version_number: u32,
    ) -> Result<Option<ConfigVersion>> {
        self.inner.get_version(kind, record_id, version_number).await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}

/// Service over a counting store, for the read-path tests.
pub fn counting_service() -> (sitecfg_service::ConfigService, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::new());
    let service = sitecfg_service::ConfigService::new(
        store.clone(),
        sitecfg_service::ServiceSettings::default(),
    );
    (service, store)
}

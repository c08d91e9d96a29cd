//! Configuration export and import.
//!
//! Snapshots carry the raw section fields keyed by kind, plus enough
//! metadata to reject documents from an incompatible schema. Import is
//! all-or-nothing: every section must validate before any is applied.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use sitecfg_core::{
    Actor, FieldError, Result, SCHEMA_VERSION, Section, SectionKind, validate_section,
};
use sitecfg_store::{CommittedWrite, ConfigStore, WriteMeta};

/// What an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    /// Every section kind.
    All,
    /// One section kind.
    Kind(SectionKind),
}

impl ExportScope {
    fn kinds(&self) -> Vec<SectionKind> {
        match self {
            ExportScope::All => SectionKind::ALL.to_vec(),
            ExportScope::Kind(kind) => vec![*kind],
        }
    }
}

/// Snapshot metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// When the snapshot was produced.
    pub exported_at: DateTime<Utc>,
    /// Schema version the sections were exported under.
    pub schema_version: String,
}

/// A portable configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Snapshot metadata.
    pub metadata: SnapshotMetadata,
    /// Raw section fields keyed by kind.
    pub sections: BTreeMap<SectionKind, Value>,
}

/// Outcome of an import attempt.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Whether this was a dry run (nothing written).
    pub dry_run: bool,
    /// Kinds applied (or that would apply, on a dry run).
    pub applied: Vec<SectionKind>,
    /// The committed writes, one per applied kind. Empty on a dry run
    /// or a rejected document.
    pub commits: Vec<CommittedWrite>,
    /// Validation errors, field names prefixed with their kind.
    pub errors: Vec<FieldError>,
}

impl ImportOutcome {
    /// True when the document validated cleanly.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Export/import operations over the store.
#[derive(Clone)]
pub struct ConfigTransfer {
    store: Arc<dyn ConfigStore>,
}

impl ConfigTransfer {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Exports the live sections in scope. Kinds with no stored record
    /// are omitted from the document.
    pub async fn export(&self, scope: ExportScope) -> Result<ConfigSnapshot> {
        let mut sections = BTreeMap::new();
        for kind in scope.kinds() {
            if let Some(record) = self.store.get_singleton(kind).await? {
                sections.insert(kind, record.section.fields_value()?);
            }
        }

        Ok(ConfigSnapshot {
            metadata: SnapshotMetadata {
                exported_at: Utc::now(),
                schema_version: SCHEMA_VERSION.to_string(),
            },
            sections,
        })
    }

    /// Imports a snapshot.
    ///
    /// Every section is validated before anything is written; one bad
    /// section rejects the whole document. A dry run reports what would
    /// apply without writing.
    pub async fn import(
        &self,
        snapshot: &ConfigSnapshot,
        actor: Actor,
        dry_run: bool,
    ) -> Result<ImportOutcome> {
        let mut validated: Vec<(SectionKind, Section)> = Vec::new();
        let mut errors: Vec<FieldError> = Vec::new();

        if snapshot.metadata.schema_version != SCHEMA_VERSION {
            errors.push(FieldError {
                field: "metadata.schema_version".to_string(),
                message: format!(
                    "unsupported schema version '{}' (expected '{SCHEMA_VERSION}')",
                    snapshot.metadata.schema_version
                ),
            });
        }

        for (kind, raw) in &snapshot.sections {
            match validate_section(*kind, raw) {
                Ok(section) => validated.push((*kind, section)),
                Err(section_errors) => {
                    errors.extend(section_errors.into_iter().map(|e| FieldError {
                        field: format!("{kind}.{}", e.field),
                        message: e.message,
                    }));
                }
            }
        }

        if !errors.is_empty() {
            return Ok(ImportOutcome {
                dry_run,
                applied: Vec::new(),
                commits: Vec::new(),
                errors,
            });
        }

        let applied: Vec<SectionKind> = validated.iter().map(|(kind, _)| *kind).collect();
        let mut commits = Vec::new();
        if !dry_run {
            for (kind, section) in validated {
                let committed = self
                    .store
                    .commit_update(
                        kind,
                        section,
                        WriteMeta::recorded(actor.clone(), Some("Imported snapshot".to_string())),
                    )
                    .await?;
                commits.push(committed);
            }
            info!(sections = applied.len(), actor = %actor, "snapshot imported");
        }

        Ok(ImportOutcome {
            dry_run,
            applied,
            commits,
            errors: Vec::new(),
        })
    }
}

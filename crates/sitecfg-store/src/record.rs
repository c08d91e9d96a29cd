//! Durable record types: live records, audit entries and version rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sitecfg_core::{Actor, ChangeAction, RecordId, Section, SectionKind};

/// The live record for one section kind.
///
/// Exactly one live record exists per kind (the singleton invariant);
/// its id is always [`sitecfg_core::SINGLETON_RECORD_ID`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Section kind this record holds.
    pub kind: SectionKind,
    /// Record identifier (always 1 for singletons).
    pub id: RecordId,
    /// The normalized section payload.
    pub section: Section,
    /// When the record was first created.
    pub created_at: DateTime<Utc>,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

/// A durable audit log entry. Immutable once created; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic entry id assigned by the store.
    pub id: u64,
    /// Section kind of the affected record.
    pub kind: SectionKind,
    /// Affected record id.
    pub record_id: RecordId,
    /// What happened.
    pub action: ChangeAction,
    /// Who made the change.
    pub actor: Actor,
    /// When the change was committed.
    pub timestamp: DateTime<Utc>,
    /// Section fields before the change; absent on create.
    pub old_value: Option<Value>,
    /// Section fields after the change.
    pub new_value: Option<Value>,
    /// Free-text reason supplied by the caller.
    pub reason: Option<String>,
}

impl AuditEntry {
    /// Names of the top-level fields whose value differs between the
    /// old and new snapshots.
    pub fn changed_fields(&self) -> Vec<String> {
        let empty = serde_json::Map::new();
        let old = self
            .old_value
            .as_ref()
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let new = self
            .new_value
            .as_ref()
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let mut fields: Vec<String> = old
            .iter()
            .filter(|(key, value)| new.get(*key) != Some(value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in new.keys() {
            if !old.contains_key(key) && !fields.contains(key) {
                fields.push(key.clone());
            }
        }
        fields.sort();
        fields
    }

    /// True when this entry carries enough state to roll back from.
    pub fn can_rollback(&self) -> bool {
        matches!(self.action, ChangeAction::Create | ChangeAction::Update)
            && self.old_value.is_some()
    }
}

/// A durable, ordered configuration snapshot.
///
/// At most one version per (kind, record_id) has `is_current == true`;
/// the store flips the previous current flag atomically when a new
/// version is created or an old one is restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigVersion {
    /// Section kind of the versioned record.
    pub kind: SectionKind,
    /// Versioned record id.
    pub record_id: RecordId,
    /// Monotonic per-record version number, starting at 1.
    pub version_number: u32,
    /// Full section snapshot at this version.
    pub snapshot: Section,
    /// Schema version the snapshot was taken under.
    pub schema_version: String,
    /// Who created the version.
    pub created_by: Actor,
    /// When the version was created.
    pub created_at: DateTime<Utc>,
    /// Whether this snapshot matches the live record's present state.
    pub is_current: bool,
    /// Free-text change summary.
    pub summary: String,
}

/// How a committed write interacts with version history.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionAction {
    /// Record a fresh snapshot as the new current version.
    Record {
        /// Free-text change summary stored on the version row.
        summary: String,
    },
    /// Re-mark an existing version as current (rollback path); the
    /// commit fails atomically if the version does not exist.
    Restore {
        /// Version number to re-mark as current.
        version_number: u32,
    },
    /// Leave version history untouched.
    Skip,
}

/// Metadata accompanying an atomic write.
#[derive(Debug, Clone)]
pub struct WriteMeta {
    /// Who performed the write.
    pub actor: Actor,
    /// Free-text reason recorded on the audit entry.
    pub reason: Option<String>,
    /// Explicit action override; derived as create/update when absent.
    pub action: Option<ChangeAction>,
    /// Version-history behavior for this write.
    pub version: VersionAction,
}

impl WriteMeta {
    /// A plain recorded write: derived action, new version snapshot.
    pub fn recorded(actor: Actor, reason: Option<String>) -> Self {
        let summary = reason.clone().unwrap_or_default();
        Self {
            actor,
            reason,
            action: None,
            version: VersionAction::Record { summary },
        }
    }

    /// A rollback write restoring an existing version.
    pub fn rollback(actor: Actor, version_number: u32) -> Self {
        Self {
            actor,
            reason: Some(format!("Rolled back to version {}", version_number)),
            action: Some(ChangeAction::Rollback),
            version: VersionAction::Restore { version_number },
        }
    }
}

/// Everything produced by one atomic write transaction.
#[derive(Debug, Clone)]
pub struct CommittedWrite {
    /// The live record after the write.
    pub record: ConfigRecord,
    /// The audit entry appended by the write.
    pub audit: AuditEntry,
    /// The version row created or restored, when the write touched history.
    pub version: Option<ConfigVersion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(old: Option<Value>, new: Option<Value>) -> AuditEntry {
        AuditEntry {
            id: 1,
            kind: SectionKind::Site,
            record_id: 1,
            action: ChangeAction::Update,
            actor: Actor::system(),
            timestamp: Utc::now(),
            old_value: old,
            new_value: new,
            reason: None,
        }
    }

    #[test]
    fn test_changed_fields_diff() {
        let e = entry(
            Some(json!({"site_name": "Acme", "domain": "acme.io"})),
            Some(json!({"site_name": "Acme Labs", "domain": "acme.io", "site_tagline": "hi"})),
        );

        assert_eq!(e.changed_fields(), vec!["site_name", "site_tagline"]);
    }

    #[test]
    fn test_changed_fields_without_snapshots() {
        let e = entry(None, None);
        assert!(e.changed_fields().is_empty());
    }

    #[test]
    fn test_can_rollback_requires_old_value() {
        let without_old = entry(None, Some(json!({})));
        assert!(!without_old.can_rollback());

        let with_old = entry(Some(json!({})), Some(json!({})));
        assert!(with_old.can_rollback());
    }

    #[test]
    fn test_write_meta_rollback_reason() {
        let meta = WriteMeta::rollback(Actor::new("ops"), 3);
        assert_eq!(meta.action, Some(ChangeAction::Rollback));
        assert!(meta.reason.unwrap().contains("version 3"));
    }
}

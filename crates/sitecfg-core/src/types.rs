//! Common type definitions and newtypes for the sitecfg domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SitecfgError;

/// Compiled-in schema version tag.
///
/// Participates in every cache key; bumping it across a deploy makes all
/// old-version keys unreachable so they expire naturally via TTL.
pub const SCHEMA_VERSION: &str = "v1";

/// Identifier of a live configuration record.
pub type RecordId = i64;

/// The single live record id per section kind. Attempts to create a
/// second record collapse onto this id.
pub const SINGLETON_RECORD_ID: RecordId = 1;

/// The four fixed configuration section kinds.
///
/// This is a closed set: audit entries, versions and cache keys all key
/// on it directly rather than on an open-ended type registry.
///
/// # Example
///
/// ```
/// use sitecfg_core::SectionKind;
///
/// let kind: SectionKind = "theme".parse().unwrap();
/// assert_eq!(kind, SectionKind::Theme);
/// assert_eq!(kind.as_str(), "theme");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Site identity: name, domain, feature flags, navigation.
    Site,
    /// SEO metadata: meta tags, canonical URL, analytics identifiers.
    Seo,
    /// Visual theme: brand colors, logos, custom CSS.
    Theme,
    /// Content and operational settings: maintenance, uploads, comments.
    Content,
}

impl SectionKind {
    /// All section kinds, in composite order.
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Site,
        SectionKind::Seo,
        SectionKind::Theme,
        SectionKind::Content,
    ];

    /// Returns the lowercase name used in keys, snapshots and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Site => "site",
            SectionKind::Seo => "seo",
            SectionKind::Theme => "theme",
            SectionKind::Content => "content",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = SitecfgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "site" => Ok(SectionKind::Site),
            "seo" => Ok(SectionKind::Seo),
            "theme" => Ok(SectionKind::Theme),
            "content" => Ok(SectionKind::Content),
            other => Err(SitecfgError::unknown_kind(other)),
        }
    }
}

/// What happened to a configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// First write of a record.
    Create,
    /// Subsequent write of an existing record.
    Update,
    /// Record removal (rejected for singletons; kept for completeness
    /// of the audit vocabulary).
    Delete,
    /// Live record overwritten from a past version snapshot.
    Rollback,
}

impl ChangeAction {
    /// Returns the lowercase name used in audit entries and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
            ChangeAction::Rollback => "rollback",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who performed a configuration change.
///
/// Audit entries and versions record the actor verbatim; the service
/// itself uses [`Actor::system`] for automated writes.
///
/// # Example
///
/// ```
/// use sitecfg_core::Actor;
///
/// let actor = Actor::new("admin@example.com");
/// assert_eq!(actor.as_str(), "admin@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// Creates a new actor identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The actor recorded for automated, non-interactive writes.
    pub fn system() -> Self {
        Self::new("system")
    }

    /// Returns the actor name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Actor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Actor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in SectionKind::ALL {
            let parsed: SectionKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        let kind: SectionKind = " SEO ".parse().unwrap();
        assert_eq!(kind, SectionKind::Seo);
    }

    #[test]
    fn test_kind_parse_rejects_unknown() {
        let result = "flags".parse::<SectionKind>();
        assert!(result.is_err());
        assert!(format!("{}", result.unwrap_err()).contains("flags"));
    }

    #[test]
    fn test_kind_serde_uses_lowercase() {
        let json = serde_json::to_string(&SectionKind::Theme).unwrap();
        assert_eq!(json, "\"theme\"");
    }

    #[test]
    fn test_action_names() {
        assert_eq!(ChangeAction::Rollback.as_str(), "rollback");
        assert_eq!(ChangeAction::Create.to_string(), "create");
    }

    #[test]
    fn test_actor_system() {
        assert_eq!(Actor::system().as_str(), "system");
    }
}

//! Sitecfg Core - Domain types, section schemas and validation
//!
//! This crate provides the foundational types for the sitecfg
//! configuration service: the four fixed section kinds, their typed
//! schemas with compiled-in defaults, the resolved composite, the
//! error taxonomy, and the pure validation/normalization layer.

pub mod composite;
pub mod error;
pub mod section;
pub mod types;
pub mod validation;

// Re-exports
pub use composite::CompositeConfig;
pub use error::{FieldError, Result, SitecfgError};
pub use section::{ContentSection, NavItem, Section, SeoSection, SiteSection, ThemeSection};
pub use types::{
    Actor, ChangeAction, RecordId, SCHEMA_VERSION, SINGLETON_RECORD_ID, SectionKind,
};
pub use validation::{ValidationReport, validate, validate_section};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_defined() {
        assert!(!version().is_empty());
    }

    #[test]
    fn version_is_semver() {
        let v = version();
        assert_eq!(v.split('.').count(), 3, "Version should be semver");
    }
}

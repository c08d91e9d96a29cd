//! The resolved composite configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::section::{ContentSection, Section, SeoSection, SiteSection, ThemeSection};
use crate::types::{SCHEMA_VERSION, SectionKind};

/// The resolved union of the four configuration sections.
///
/// Constructed on each cache miss, immutable once constructed, and
/// discarded after caching. Callers always see either a fully-resolved
/// instance or [`CompositeConfig::fallback`] — never a partial composite.
///
/// # Example
///
/// ```
/// use sitecfg_core::CompositeConfig;
///
/// let config = CompositeConfig::fallback();
/// assert_eq!(config.site.site_name, "My Site");
/// assert!(!config.feature_flag("beta_search", false));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeConfig {
    /// Site identity section.
    pub site: SiteSection,
    /// SEO metadata section.
    pub seo: SeoSection,
    /// Visual theme section.
    pub theme: ThemeSection,
    /// Content/operational section.
    pub content: ContentSection,
    /// Schema version the composite was resolved under.
    pub schema_version: String,
    /// When this composite was assembled.
    pub resolved_at: DateTime<Utc>,
}

impl CompositeConfig {
    /// Assembles a composite from four resolved sections.
    pub fn new(
        site: SiteSection,
        seo: SeoSection,
        theme: ThemeSection,
        content: ContentSection,
    ) -> Self {
        Self {
            site,
            seo,
            theme,
            content,
            schema_version: SCHEMA_VERSION.to_string(),
            resolved_at: Utc::now(),
        }
    }

    /// The hard-coded fallback configuration returned when live
    /// resolution fails entirely.
    ///
    /// These are best-effort normal defaults, not an emergency mode:
    /// maintenance is NOT forced on, so a total configuration outage
    /// degrades to a plainly-branded site rather than an error page.
    pub fn fallback() -> Self {
        Self::new(
            SiteSection::default(),
            SeoSection::default(),
            ThemeSection::default(),
            ContentSection::default(),
        )
    }

    /// Returns the section of the given kind as a tagged [`Section`].
    pub fn section(&self, kind: SectionKind) -> Section {
        match kind {
            SectionKind::Site => Section::Site(self.site.clone()),
            SectionKind::Seo => Section::Seo(self.seo.clone()),
            SectionKind::Theme => Section::Theme(self.theme.clone()),
            SectionKind::Content => Section::Content(self.content.clone()),
        }
    }

    /// Convenience accessor over the Site section's feature flags.
    pub fn feature_flag(&self, name: &str, default: bool) -> bool {
        self.site
            .feature_flags
            .get(name)
            .copied()
            .unwrap_or(default)
    }
}

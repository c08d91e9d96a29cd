//! Typed configuration sections.
//!
//! Each of the four section kinds has a fixed set of typed fields with
//! compiled-in defaults. Unknown input fields are preserved in `extra`
//! for forward-compatibility rather than rejected.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::SectionKind;

/// A single navigation entry. Label and URL are both required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavItem {
    /// Display label.
    pub label: String,
    /// Link target; http(s) or site-relative.
    pub url: String,
}

impl NavItem {
    /// Creates a new navigation item.
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Site identity configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSection {
    /// Display name used throughout the site.
    pub site_name: String,
    /// Brief tagline shown in footers and meta tags.
    pub site_tagline: String,
    /// Primary domain for canonical URLs (bare hostname, no scheme).
    pub domain: String,
    /// Primary contact email address, stored lower-cased.
    pub contact_email: String,
    /// Feature flags; values are strictly boolean.
    pub feature_flags: IndexMap<String, bool>,
    /// Main navigation structure, in display order.
    pub navigation: Vec<NavItem>,
    /// Unknown fields preserved from input.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            site_name: "My Site".to_string(),
            site_tagline: String::new(),
            domain: String::new(),
            contact_email: String::new(),
            feature_flags: IndexMap::new(),
            navigation: Vec::new(),
            extra: IndexMap::new(),
        }
    }
}

/// SEO metadata configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoSection {
    /// Default meta title (max 60 characters).
    pub meta_title: String,
    /// Default meta description (max 160 characters).
    pub meta_description: String,
    /// Comma-separated meta keywords.
    pub meta_keywords: String,
    /// Prevent search engines from indexing the site.
    pub noindex: bool,
    /// Canonical URL for the site.
    pub canonical_url: String,
    /// Default Open Graph image URL.
    pub og_image: String,
    /// Google Search Console verification code.
    pub google_site_verification: String,
    /// Google Analytics tracking ID.
    pub google_analytics_id: String,
    /// Unknown fields preserved from input.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for SeoSection {
    fn default() -> Self {
        Self {
            meta_title: String::new(),
            meta_description: String::new(),
            meta_keywords: String::new(),
            noindex: false,
            canonical_url: String::new(),
            og_image: String::new(),
            google_site_verification: String::new(),
            google_analytics_id: String::new(),
            extra: IndexMap::new(),
        }
    }
}

/// Visual theme configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSection {
    /// Primary brand color, `#rrggbb` or `#rgb`.
    pub primary_color: String,
    /// Secondary brand color, `#rrggbb` or `#rgb`.
    pub secondary_color: String,
    /// URL to the favicon file.
    pub favicon_url: String,
    /// URL to the site logo.
    pub logo_url: String,
    /// Custom CSS injected into pages. Rejected outright if it carries
    /// script content; never sanitized.
    pub custom_css: String,
    /// Enable dark mode support.
    pub dark_mode_enabled: bool,
    /// Unknown fields preserved from input.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for ThemeSection {
    fn default() -> Self {
        Self {
            primary_color: "#007bff".to_string(),
            secondary_color: "#6c757d".to_string(),
            favicon_url: String::new(),
            logo_url: String::new(),
            custom_css: String::new(),
            dark_mode_enabled: true,
            extra: IndexMap::new(),
        }
    }
}

/// Content and operational configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    /// Serve the maintenance page instead of regular content.
    pub maintenance_mode: bool,
    /// Message displayed during maintenance.
    pub maintenance_message: String,
    /// Enable comments site-wide.
    pub comments_enabled: bool,
    /// Allow new user registrations.
    pub registration_enabled: bool,
    /// Maximum file upload size in megabytes (1..=100).
    pub max_upload_size_mb: u32,
    /// Allowed file extensions for uploads, each starting with a dot.
    pub allowed_file_extensions: Vec<String>,
    /// Unknown fields preserved from input.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            maintenance_message: "We're currently performing maintenance. Please check back soon."
                .to_string(),
            comments_enabled: true,
            registration_enabled: true,
            max_upload_size_mb: 10,
            allowed_file_extensions: vec![
                ".jpg".to_string(),
                ".jpeg".to_string(),
                ".png".to_string(),
                ".pdf".to_string(),
            ],
            extra: IndexMap::new(),
        }
    }
}

/// Tagged union over the four section kinds.
///
/// Snapshots, version rows and live records all carry a `Section`; the
/// tag keeps (de)serialization self-describing.
///
/// # Example
///
/// ```
/// use sitecfg_core::{Section, SectionKind};
///
/// let section = Section::default_for(SectionKind::Theme);
/// assert_eq!(section.kind(), SectionKind::Theme);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Section {
    /// Site identity section.
    Site(SiteSection),
    /// SEO metadata section.
    Seo(SeoSection),
    /// Visual theme section.
    Theme(ThemeSection),
    /// Content/operational section.
    Content(ContentSection),
}

impl Section {
    /// Returns the kind of this section.
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Site(_) => SectionKind::Site,
            Section::Seo(_) => SectionKind::Seo,
            Section::Theme(_) => SectionKind::Theme,
            Section::Content(_) => SectionKind::Content,
        }
    }

    /// Returns the compiled-in default section for a kind.
    pub fn default_for(kind: SectionKind) -> Self {
        match kind {
            SectionKind::Site => Section::Site(SiteSection::default()),
            SectionKind::Seo => Section::Seo(SeoSection::default()),
            SectionKind::Theme => Section::Theme(ThemeSection::default()),
            SectionKind::Content => Section::Content(ContentSection::default()),
        }
    }

    /// Serializes only the section fields, without the kind tag.
    ///
    /// This is the shape raw editing surfaces submit and the shape
    /// stored in audit snapshots and export documents.
    pub fn fields_value(&self) -> Result<Value> {
        let value = match self {
            Section::Site(s) => serde_json::to_value(s)?,
            Section::Seo(s) => serde_json::to_value(s)?,
            Section::Theme(s) => serde_json::to_value(s)?,
            Section::Content(s) => serde_json::to_value(s)?,
        };
        Ok(value)
    }

    /// Consumes the section, returning the Site payload when it is one.
    pub fn into_site(self) -> Option<SiteSection> {
        match self {
            Section::Site(s) => Some(s),
            _ => None,
        }
    }

    /// Consumes the section, returning the Seo payload when it is one.
    pub fn into_seo(self) -> Option<SeoSection> {
        match self {
            Section::Seo(s) => Some(s),
            _ => None,
        }
    }

    /// Consumes the section, returning the Theme payload when it is one.
    pub fn into_theme(self) -> Option<ThemeSection> {
        match self {
            Section::Theme(s) => Some(s),
            _ => None,
        }
    }

    /// Consumes the section, returning the Content payload when it is one.
    pub fn into_content(self) -> Option<ContentSection> {
        match self {
            Section::Content(s) => Some(s),
            _ => None,
        }
    }
}

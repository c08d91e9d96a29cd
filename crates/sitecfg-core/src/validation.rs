//! Schema validation and normalization.
//!
//! [`validate_section`] is the single entry point between raw, possibly
//! partial, possibly malformed input and a typed [`Section`]. It is pure
//! and side-effect-free, and it is idempotent: re-validating its own
//! normalized output is a fixed point.
//!
//! Policy:
//! - one [`FieldError`] per invalid field, all collected before returning
//! - unknown fields are preserved in `extra`, not rejected
//! - missing fields fall back to the section's compiled-in defaults
//! - security-sensitive values (CSS, URLs) carrying script content are
//!   rejected, never sanitized

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FieldError;
use crate::section::{
    ContentSection, NavItem, Section, SeoSection, SiteSection, ThemeSection,
};
use crate::types::SectionKind;

/// Caller-facing validation outcome: valid flag plus every field error
/// and advisory warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when no field errors were found.
    pub valid: bool,
    /// One entry per invalid field.
    pub errors: Vec<FieldError>,
    /// Advisory problems that do not block persistence.
    pub warnings: Vec<String>,
}

/// Validates and normalizes raw input for a section kind.
///
/// Returns the normalized typed section, or every field-level problem
/// found. Coercions applied: strings are trimmed, emails lower-cased,
/// file extensions lower-cased.
///
/// # Example
///
/// ```
/// use sitecfg_core::{validate_section, SectionKind};
/// use serde_json::json;
///
/// let errors = validate_section(SectionKind::Theme, &json!({"primary_color": "blue"}))
///     .unwrap_err();
/// assert_eq!(errors[0].field, "primary_color");
/// ```
pub fn validate_section(
    kind: SectionKind,
    raw: &Value,
) -> std::result::Result<Section, Vec<FieldError>> {
    match kind {
        SectionKind::Site => validate_site(raw),
        SectionKind::Seo => validate_seo(raw),
        SectionKind::Theme => validate_theme(raw),
        SectionKind::Content => validate_content(raw),
    }
}

/// Validates raw input and reports errors and warnings without
/// constructing a section. This is the shape editing surfaces consume.
pub fn validate(kind: SectionKind, raw: &Value) -> ValidationReport {
    match validate_section(kind, raw) {
        Ok(section) => ValidationReport {
            valid: true,
            errors: Vec::new(),
            warnings: collect_warnings(&section),
        },
        Err(errors) => ValidationReport {
            valid: false,
            errors,
            warnings: Vec::new(),
        },
    }
}

fn collect_warnings(section: &Section) -> Vec<String> {
    let mut warnings = Vec::new();
    match section {
        Section::Site(site) => {
            if site.contact_email.is_empty() {
                warnings.push("contact_email is not set; user support links will be empty".into());
            }
        }
        Section::Seo(seo) => {
            if seo.meta_title.is_empty() {
                warnings
                    .push("meta_title is empty; search snippets fall back to page titles".into());
            }
        }
        Section::Theme(_) => {}
        Section::Content(content) => {
            if content.max_upload_size_mb > 50 {
                warnings.push(format!(
                    "max_upload_size_mb of {} is quite large; consider performance",
                    content.max_upload_size_mb
                ));
            }
        }
    }
    warnings
}

// ============================================
// Field extraction
// ============================================

/// Working set for one section's raw input: consumed known fields leave
/// behind the `extra` map, and errors accumulate instead of short-circuiting.
struct Fields {
    map: Map<String, Value>,
    errors: Vec<FieldError>,
}

impl Fields {
    fn new(raw: &Value) -> std::result::Result<Self, Vec<FieldError>> {
        match raw {
            Value::Object(map) => Ok(Self {
                map: map.clone(),
                errors: Vec::new(),
            }),
            Value::Null => Ok(Self {
                map: Map::new(),
                errors: Vec::new(),
            }),
            _ => Err(vec![FieldError::new(
                "_root",
                "section input must be an object",
            )]),
        }
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Trimmed string with a length bound; missing or null falls back
    /// to the default.
    fn string(&mut self, key: &str, max_chars: usize, default: &str) -> String {
        match self.map.remove(key) {
            Some(Value::String(s)) => {
                let trimmed = s.trim().to_string();
                if trimmed.chars().count() > max_chars {
                    self.error(key, format!("must be at most {} characters", max_chars));
                }
                trimmed
            }
            Some(Value::Null) | None => default.to_string(),
            Some(_) => {
                self.error(key, "must be a string");
                default.to_string()
            }
        }
    }

    fn bool(&mut self, key: &str, default: bool) -> bool {
        match self.map.remove(key) {
            Some(Value::Bool(b)) => b,
            Some(Value::Null) | None => default,
            Some(_) => {
                self.error(key, "must be a boolean");
                default
            }
        }
    }

    fn u32_range(&mut self, key: &str, min: u32, max: u32, default: u32) -> u32 {
        match self.map.remove(key) {
            Some(Value::Number(n)) => match n.as_u64() {
                Some(v) if v >= u64::from(min) && v <= u64::from(max) => v as u32,
                Some(_) => {
                    self.error(key, format!("must be between {} and {}", min, max));
                    default
                }
                None => {
                    self.error(key, "must be a non-negative integer");
                    default
                }
            },
            Some(Value::Null) | None => default,
            Some(_) => {
                self.error(key, "must be an integer");
                default
            }
        }
    }

    /// Everything not consumed by a typed field is preserved verbatim.
    fn take_extra(&mut self) -> IndexMap<String, Value> {
        std::mem::take(&mut self.map).into_iter().collect()
    }

    fn into_result(self, section: Section) -> std::result::Result<Section, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(section)
        } else {
            Err(self.errors)
        }
    }
}

// ============================================
// Per-section validators
// ============================================

fn validate_site(raw: &Value) -> std::result::Result<Section, Vec<FieldError>> {
    let d = SiteSection::default();
    let mut f = Fields::new(raw)?;

    let site_name = f.string("site_name", 120, &d.site_name);
    if site_name.is_empty() {
        f.error("site_name", "is required");
    }

    let site_tagline = f.string("site_tagline", 200, &d.site_tagline);

    let domain = f.string("domain", 255, &d.domain);
    if let Some(msg) = check_domain(&domain) {
        f.error("domain", msg);
    }

    let contact_email = f.string("contact_email", 254, &d.contact_email).to_lowercase();
    if let Some(msg) = check_email(&contact_email) {
        f.error("contact_email", msg);
    }

    let feature_flags = take_feature_flags(&mut f);
    let navigation = take_navigation(&mut f);
    let extra = f.take_extra();

    f.into_result(Section::Site(SiteSection {
        site_name,
        site_tagline,
        domain,
        contact_email,
        feature_flags,
        navigation,
        extra,
    }))
}

fn validate_seo(raw: &Value) -> std::result::Result<Section, Vec<FieldError>> {
    let d = SeoSection::default();
    let mut f = Fields::new(raw)?;

    let meta_title = f.string("meta_title", 60, &d.meta_title);
    let meta_description = f.string("meta_description", 160, &d.meta_description);
    let meta_keywords = f.string("meta_keywords", 255, &d.meta_keywords);
    let noindex = f.bool("noindex", d.noindex);

    let canonical_url = f.string("canonical_url", 200, &d.canonical_url);
    if let Some(msg) = check_url(&canonical_url) {
        f.error("canonical_url", msg);
    }

    let og_image = f.string("og_image", 200, &d.og_image);
    if let Some(msg) = check_url(&og_image) {
        f.error("og_image", msg);
    }

    let google_site_verification =
        f.string("google_site_verification", 100, &d.google_site_verification);
    let google_analytics_id = f.string("google_analytics_id", 50, &d.google_analytics_id);
    let extra = f.take_extra();

    f.into_result(Section::Seo(SeoSection {
        meta_title,
        meta_description,
        meta_keywords,
        noindex,
        canonical_url,
        og_image,
        google_site_verification,
        google_analytics_id,
        extra,
    }))
}

fn validate_theme(raw: &Value) -> std::result::Result<Section, Vec<FieldError>> {
    let d = ThemeSection::default();
    let mut f = Fields::new(raw)?;

    let primary_color = f.string("primary_color", 7, &d.primary_color);
    if let Some(msg) = check_hex_color(&primary_color) {
        f.error("primary_color", msg);
    }

    let secondary_color = f.string("secondary_color", 7, &d.secondary_color);
    if let Some(msg) = check_hex_color(&secondary_color) {
        f.error("secondary_color", msg);
    }

    let favicon_url = f.string("favicon_url", 200, &d.favicon_url);
    if let Some(msg) = check_url(&favicon_url) {
        f.error("favicon_url", msg);
    }

    let logo_url = f.string("logo_url", 200, &d.logo_url);
    if let Some(msg) = check_url(&logo_url) {
        f.error("logo_url", msg);
    }

    let custom_css = f.string("custom_css", 20_000, &d.custom_css);
    if let Some(msg) = check_css(&custom_css) {
        f.error("custom_css", msg);
    }

    let dark_mode_enabled = f.bool("dark_mode_enabled", d.dark_mode_enabled);
    let extra = f.take_extra();

    f.into_result(Section::Theme(ThemeSection {
        primary_color,
        secondary_color,
        favicon_url,
        logo_url,
        custom_css,
        dark_mode_enabled,
        extra,
    }))
}

fn validate_content(raw: &Value) -> std::result::Result<Section, Vec<FieldError>> {
    let d = ContentSection::default();
    let mut f = Fields::new(raw)?;

    let maintenance_mode = f.bool("maintenance_mode", d.maintenance_mode);
    let maintenance_message = f.string("maintenance_message", 2_000, &d.maintenance_message);
    if maintenance_mode && maintenance_message.is_empty() {
        f.error(
            "maintenance_message",
            "is required when maintenance mode is enabled",
        );
    }

    let comments_enabled = f.bool("comments_enabled", d.comments_enabled);
    let registration_enabled = f.bool("registration_enabled", d.registration_enabled);
    let max_upload_size_mb = f.u32_range("max_upload_size_mb", 1, 100, d.max_upload_size_mb);
    let allowed_file_extensions = take_extensions(&mut f, &d.allowed_file_extensions);
    let extra = f.take_extra();

    f.into_result(Section::Content(ContentSection {
        maintenance_mode,
        maintenance_message,
        comments_enabled,
        registration_enabled,
        max_upload_size_mb,
        allowed_file_extensions,
        extra,
    }))
}

// ============================================
// Structured field helpers
// ============================================

fn take_feature_flags(f: &mut Fields) -> IndexMap<String, bool> {
    match f.map.remove("feature_flags") {
        Some(Value::Object(map)) => {
            let mut flags = IndexMap::new();
            for (name, value) in map {
                let name = name.trim().to_string();
                if name.is_empty() {
                    f.error("feature_flags", "flag names must be non-empty");
                    continue;
                }
                match value {
                    Value::Bool(b) => {
                        flags.insert(name, b);
                    }
                    _ => f.error(format!("feature_flags.{}", name), "must be a boolean"),
                }
            }
            flags
        }
        Some(Value::Null) | None => IndexMap::new(),
        Some(_) => {
            f.error("feature_flags", "must be an object of boolean flags");
            IndexMap::new()
        }
    }
}

fn take_navigation(f: &mut Fields) -> Vec<NavItem> {
    match f.map.remove("navigation") {
        Some(Value::Array(items)) => {
            let mut navigation = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let Value::Object(entry) = item else {
                    f.error(
                        format!("navigation[{}]", i),
                        "must be an object with label and url",
                    );
                    continue;
                };

                let label = entry
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string();
                if label.is_empty() {
                    f.error(format!("navigation[{}].label", i), "is required");
                } else if label.chars().count() > 80 {
                    f.error(
                        format!("navigation[{}].label", i),
                        "must be at most 80 characters",
                    );
                }

                let url = entry
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string();
                if url.is_empty() {
                    f.error(format!("navigation[{}].url", i), "is required");
                } else if let Some(msg) = check_url(&url) {
                    f.error(format!("navigation[{}].url", i), msg);
                }

                navigation.push(NavItem::new(label, url));
            }
            navigation
        }
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            f.error("navigation", "must be a list of navigation items");
            Vec::new()
        }
    }
}

fn take_extensions(f: &mut Fields, default: &[String]) -> Vec<String> {
    match f.map.remove("allowed_file_extensions") {
        Some(Value::Array(items)) => {
            let mut extensions = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let Value::String(raw) = item else {
                    f.error(format!("allowed_file_extensions[{}]", i), "must be a string");
                    continue;
                };
                let ext = raw.trim().to_lowercase();
                if !ext.starts_with('.') || ext.len() < 2 || ext.len() > 16 {
                    f.error(
                        format!("allowed_file_extensions[{}]", i),
                        "must be an extension like '.png'",
                    );
                    continue;
                }
                extensions.push(ext);
            }
            extensions
        }
        Some(Value::Null) | None => default.to_vec(),
        Some(_) => {
            f.error("allowed_file_extensions", "must be a list of extensions");
            default.to_vec()
        }
    }
}

// ============================================
// Value checks
// ============================================

/// Script content that is rejected outright wherever it appears.
fn has_dangerous_content(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.contains("<script") || lower.contains("javascript:") || lower.contains("data:text/html")
}

fn check_url(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return None;
    }
    if has_dangerous_content(value) {
        return Some("contains disallowed content");
    }
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || value.starts_with('/') {
        None
    } else {
        Some("must be an http(s) or site-relative URL")
    }
}

fn check_css(value: &str) -> Option<&'static str> {
    if has_dangerous_content(value) {
        Some("contains disallowed content")
    } else {
        None
    }
}

fn check_hex_color(value: &str) -> Option<&'static str> {
    let valid = value
        .strip_prefix('#')
        .map(|digits| {
            (digits.len() == 3 || digits.len() == 6)
                && digits.chars().all(|c| c.is_ascii_hexdigit())
        })
        .unwrap_or(false);
    if valid {
        None
    } else {
        Some("must be a hex color like #1a2b3c or #abc")
    }
}

fn check_email(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return None;
    }
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    let valid = !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !value.contains(char::is_whitespace)
        && value.matches('@').count() == 1;
    if valid {
        None
    } else {
        Some("must be a valid email address")
    }
}

fn check_domain(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return None;
    }
    const MSG: &str = "must be a bare domain like 'example.com' (no scheme or path)";
    if value.len() > 255 {
        return Some(MSG);
    }
    let labels: Vec<&str> = value.split('.').collect();
    if labels.len() < 2 {
        return Some(MSG);
    }
    for label in &labels {
        let ok = !label.is_empty()
            && label.len() <= 63
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-');
        if !ok {
            return Some(MSG);
        }
    }
    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(MSG);
    }
    None
}

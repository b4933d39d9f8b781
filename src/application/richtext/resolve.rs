//! Turning internal document references into link targets.

use crate::domain::content::page_path;
use crate::domain::richtext::LinkDoc;

/// Maps a referenced CMS document to an href.
pub trait ReferenceResolver: Send + Sync {
    fn resolve(&self, doc: &LinkDoc) -> Option<String>;
}

/// Uses the referenced document id as the href verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawIdResolver;

impl ReferenceResolver for RawIdResolver {
    fn resolve(&self, doc: &LinkDoc) -> Option<String> {
        let id = doc.value.id.trim();
        (!id.is_empty()).then(|| id.to_string())
    }
}

/// Resolves populated page references to `/{locale}/{slug}`.
///
/// References without a slug (unpopulated, or pointing at another collection)
/// fall back to the raw id.
#[derive(Debug, Clone)]
pub struct SlugPathResolver {
    locale: String,
}

impl SlugPathResolver {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }
}

impl ReferenceResolver for SlugPathResolver {
    fn resolve(&self, doc: &LinkDoc) -> Option<String> {
        let is_page = doc
            .relation_to
            .as_deref()
            .is_none_or(|relation| relation == "pages");
        match doc.value.slug.as_deref() {
            Some(slug) if is_page && !slug.is_empty() => Some(page_path(&self.locale, slug)),
            _ => RawIdResolver.resolve(doc),
        }
    }
}

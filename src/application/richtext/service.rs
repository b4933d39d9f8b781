use std::sync::Arc;

use crate::domain::richtext::Document;

use super::context::{RenderContext, render_document};
use super::registry::RendererRegistry;
use super::resolve::{RawIdResolver, ReferenceResolver};
use super::types::{RenderError, SubmissionData};

/// Shared entry point for turning rich-text documents into HTML.
#[derive(Clone)]
pub struct RichTextRenderer {
    registry: Arc<RendererRegistry>,
    resolver: Arc<dyn ReferenceResolver>,
}

impl RichTextRenderer {
    pub fn new(registry: Arc<RendererRegistry>) -> Self {
        Self {
            registry,
            resolver: Arc::new(RawIdResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn registry(&self) -> &Arc<RendererRegistry> {
        &self.registry
    }

    /// Render `document`; `None` when it has no content.
    pub fn render(
        &self,
        document: &Document,
        submission: Option<&SubmissionData>,
    ) -> Result<Option<String>, RenderError> {
        let ctx = RenderContext::new(&self.registry, self.resolver.as_ref())
            .with_submission_data(submission);
        render_document(document, ctx)
    }

    /// Render with a resolver other than the configured one.
    pub fn render_with(
        &self,
        document: &Document,
        resolver: &dyn ReferenceResolver,
    ) -> Result<Option<String>, RenderError> {
        render_document(document, RenderContext::new(&self.registry, resolver))
    }
}

impl Default for RichTextRenderer {
    fn default() -> Self {
        Self::new(Arc::new(RendererRegistry::standard()))
    }
}

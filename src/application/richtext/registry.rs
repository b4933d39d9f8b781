//! Node renderer registry.
//!
//! The registry is the extension point of the renderer: new node kinds are
//! supported by appending a [`NodeRenderer`], never by editing dispatch.
//! Lookups go through a type index built once at construction; when two
//! renderers claim the same type the one registered first wins.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::richtext::Node;

use super::context::RenderContext;
use super::nodes::{self, UnknownNodeRenderer};
use super::types::RenderError;

/// Converts one kind of node into HTML.
pub trait NodeRenderer: Send + Sync {
    /// Node `type` tags handled by this renderer.
    fn node_types(&self) -> &'static [&'static str];

    /// Render `node`; nested content goes back through `ctx`.
    fn render<'a>(&self, node: &'a Node, ctx: &RenderContext<'a>) -> Result<String, RenderError>;
}

pub struct RendererRegistry {
    entries: Vec<Arc<dyn NodeRenderer>>,
    index: HashMap<&'static str, usize>,
    fallback: Arc<dyn NodeRenderer>,
}

impl RendererRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// All built-in renderers plus the `coral-highlight` extension.
    pub fn standard() -> Self {
        Self::builder()
            .with_builtins()
            .with(nodes::CoralHighlightRenderer)
            .build()
    }

    pub fn lookup(&self, node_type: &str) -> Option<&dyn NodeRenderer> {
        self.index
            .get(node_type)
            .map(|&position| self.entries[position].as_ref())
    }

    /// Renderer used when no entry matches.
    pub fn fallback(&self) -> &dyn NodeRenderer {
        self.fallback.as_ref()
    }

    pub fn supports(&self, node_type: &str) -> bool {
        self.index.contains_key(node_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<Arc<dyn NodeRenderer>>,
    fallback: Option<Arc<dyn NodeRenderer>>,
}

impl RegistryBuilder {
    pub fn with<R: NodeRenderer + 'static>(mut self, renderer: R) -> Self {
        self.entries.push(Arc::new(renderer));
        self
    }

    pub fn with_builtins(self) -> Self {
        self.with(nodes::TextRenderer)
            .with(nodes::ParagraphRenderer)
            .with(nodes::HeadingRenderer)
            .with(nodes::LinebreakRenderer)
            .with(nodes::LinkRenderer)
            .with(nodes::ListRenderer)
            .with(nodes::ListItemRenderer)
            .with(nodes::QuoteRenderer)
    }

    /// Replace the placeholder renderer used for unmatched node types.
    pub fn with_fallback<R: NodeRenderer + 'static>(mut self, renderer: R) -> Self {
        self.fallback = Some(Arc::new(renderer));
        self
    }

    pub fn build(self) -> RendererRegistry {
        let mut index = HashMap::new();
        for (position, renderer) in self.entries.iter().enumerate() {
            for &node_type in renderer.node_types() {
                if index.contains_key(node_type) {
                    debug!(
                        target = "coralpress::richtext::registry",
                        node_type, position, "renderer shadowed by earlier entry"
                    );
                    continue;
                }
                index.insert(node_type, position);
            }
        }

        RendererRegistry {
            entries: self.entries,
            index,
            fallback: self
                .fallback
                .unwrap_or_else(|| Arc::new(UnknownNodeRenderer)),
        }
    }
}

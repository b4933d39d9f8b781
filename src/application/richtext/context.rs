use metrics::counter;
use tracing::warn;

use crate::domain::richtext::{Document, Node};

use super::registry::RendererRegistry;
use super::resolve::ReferenceResolver;
use super::types::{RenderError, SubmissionData};

/// Per-call rendering state threaded through every renderer.
///
/// Cheap to copy: holds only borrows. `parent` is the node whose children are
/// currently being rendered, `None` at the document root.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    registry: &'a RendererRegistry,
    resolver: &'a dyn ReferenceResolver,
    submission: Option<&'a SubmissionData>,
    parent: Option<&'a Node>,
}

impl<'a> RenderContext<'a> {
    pub fn new(registry: &'a RendererRegistry, resolver: &'a dyn ReferenceResolver) -> Self {
        Self {
            registry,
            resolver,
            submission: None,
            parent: None,
        }
    }

    pub fn with_submission_data(mut self, data: Option<&'a SubmissionData>) -> Self {
        self.submission = data;
        self
    }

    pub fn registry(&self) -> &'a RendererRegistry {
        self.registry
    }

    pub fn resolver(&self) -> &'a dyn ReferenceResolver {
        self.resolver
    }

    pub fn submission_data(&self) -> Option<&'a SubmissionData> {
        self.submission
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.parent
    }

    /// Render a single node through the registry.
    ///
    /// Malformed nodes and nodes without a registered renderer go to the
    /// registry's fallback after a warning; the surrounding content keeps
    /// rendering.
    pub fn render_node(&self, node: &'a Node) -> Result<String, RenderError> {
        let node_type = node.node_type();

        if let Some(defect) = node.defect() {
            warn!(
                target = "coralpress::richtext",
                node_type, defect, "malformed rich-text node rendered as placeholder"
            );
            counter!("coralpress_richtext_unrendered_total", "reason" => "malformed").increment(1);
            return self.registry.fallback().render(node, self);
        }

        match self.registry.lookup(node_type) {
            Some(renderer) => renderer.render(node, self),
            None => {
                warn!(
                    target = "coralpress::richtext",
                    node_type, "no renderer registered for rich-text node"
                );
                counter!("coralpress_richtext_unrendered_total", "reason" => "unregistered")
                    .increment(1);
                self.registry.fallback().render(node, self)
            }
        }
    }

    /// Render `nodes` in order and concatenate the output.
    pub fn render_nodes(&self, nodes: &'a [Node]) -> Result<String, RenderError> {
        let mut html = String::new();
        for node in nodes {
            html.push_str(&self.render_node(node)?);
        }
        Ok(html)
    }

    /// Context for rendering the children of `parent`.
    pub fn for_child(&self, parent: &'a Node) -> Self {
        Self {
            parent: Some(parent),
            ..*self
        }
    }

    /// Render the children of `parent` with `parent` as their context parent.
    pub fn render_children(&self, parent: &'a Node) -> Result<String, RenderError> {
        render_children(parent.children(), parent, self)
    }
}

/// Route one node to its renderer. See [`RenderContext::render_node`].
pub fn dispatch<'a>(node: &'a Node, ctx: &RenderContext<'a>) -> Result<String, RenderError> {
    ctx.render_node(node)
}

/// Render `children` of `parent` depth-first, in document order.
pub fn render_children<'a>(
    children: &'a [Node],
    parent: &'a Node,
    ctx: &RenderContext<'a>,
) -> Result<String, RenderError> {
    ctx.for_child(parent).render_nodes(children)
}

/// Render a whole document. Returns `Ok(None)` when there is nothing to show.
pub fn render_document<'a>(
    document: &'a Document,
    ctx: RenderContext<'a>,
) -> Result<Option<String>, RenderError> {
    if document.is_empty() {
        return Ok(None);
    }
    ctx.render_nodes(&document.root.children).map(Some)
}

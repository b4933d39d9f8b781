use askama::Template;

use crate::application::richtext::context::RenderContext;
use crate::application::richtext::registry::NodeRenderer;
use crate::application::richtext::types::RenderError;
use crate::domain::richtext::Node;

#[derive(Template)]
#[template(
    source = r#"<span class="richtext-unknown" role="note" data-node-type="{{ node_type }}">Unsupported content: {{ label }}</span>"#,
    ext = "html"
)]
struct PlaceholderTemplate<'a> {
    node_type: &'a str,
    label: &'a str,
}

/// Visible placeholder for nodes nothing else can render.
pub struct UnknownNodeRenderer;

impl NodeRenderer for UnknownNodeRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[]
    }

    fn render<'a>(&self, node: &'a Node, _ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        let node_type = node.node_type();
        let label = if node_type.is_empty() {
            "untyped node"
        } else {
            node_type
        };
        Ok(PlaceholderTemplate { node_type, label }.render()?)
    }
}

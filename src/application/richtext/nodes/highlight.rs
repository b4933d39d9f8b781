use askama::Template;

use crate::application::richtext::context::RenderContext;
use crate::application::richtext::registry::NodeRenderer;
use crate::application::richtext::types::RenderError;
use crate::domain::richtext::{Node, node_types};

#[derive(Template)]
#[template(source = r#"<span class="coral-highlight">{{ children|safe }}</span>"#, ext = "html")]
struct CoralHighlightTemplate {
    children: String,
}

/// Renders the editor's `coral-highlight` wrapper around a text run.
pub struct CoralHighlightRenderer;

impl NodeRenderer for CoralHighlightRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[node_types::CORAL_HIGHLIGHT]
    }

    fn render<'a>(&self, node: &'a Node, ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        Ok(CoralHighlightTemplate {
            children: ctx.render_children(node)?,
        }
        .render()?)
    }
}

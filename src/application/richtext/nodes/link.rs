use askama::Template;
use tracing::warn;

use crate::application::richtext::context::RenderContext;
use crate::application::richtext::markup::{is_safe_href, substitute_placeholders};
use crate::application::richtext::registry::NodeRenderer;
use crate::application::richtext::types::RenderError;
use crate::domain::richtext::{LinkFields, Node, node_types};

const EMPTY_HREF: &str = "#";

#[derive(Template)]
#[template(
    source = r#"<a href="{{ href }}"{% if new_tab %} target="_blank" rel="noopener noreferrer"{% endif %}>{{ children|safe }}</a>"#,
    ext = "html"
)]
struct LinkTemplate {
    href: String,
    new_tab: bool,
    children: String,
}

/// Renders `link` nodes. Custom links use their URL; internal links go
/// through the context's reference resolver.
pub struct LinkRenderer;

impl LinkRenderer {
    fn href(fields: &LinkFields, ctx: &RenderContext<'_>) -> String {
        let target = if fields.is_custom() {
            fields.url.clone()
        } else {
            fields
                .doc
                .as_ref()
                .and_then(|doc| ctx.resolver().resolve(doc))
        };
        let Some(target) = target.filter(|href| !href.trim().is_empty()) else {
            return EMPTY_HREF.to_string();
        };

        let target = match ctx.submission_data() {
            Some(data) => substitute_placeholders(&target, data),
            None => target,
        };

        if !is_safe_href(&target) {
            warn!(
                target = "coralpress::richtext::link",
                href = %target,
                "dropping link target with script scheme"
            );
            return EMPTY_HREF.to_string();
        }
        target
    }
}

impl NodeRenderer for LinkRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[node_types::LINK]
    }

    fn render<'a>(&self, node: &'a Node, ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        let Node::Link(link) = node else {
            return Err(RenderError::shape("link", node));
        };
        Ok(LinkTemplate {
            href: Self::href(&link.fields, ctx),
            new_tab: link.fields.new_tab,
            children: ctx.render_children(node)?,
        }
        .render()?)
    }
}

use askama::Template;

use crate::application::richtext::context::RenderContext;
use crate::application::richtext::markup::{Alignment, LINE_BREAK};
use crate::application::richtext::registry::NodeRenderer;
use crate::application::richtext::types::RenderError;
use crate::domain::richtext::{Node, node_types};

#[derive(Template)]
#[template(source = r#"<p class="{{ class }}">{{ children|safe }}</p>"#, ext = "html")]
struct ParagraphTemplate<'a> {
    class: &'a str,
    children: String,
}

#[derive(Template)]
#[template(
    source = r#"<{{ tag }} class="{{ class }}">{{ children|safe }}</{{ tag }}>"#,
    ext = "html"
)]
struct HeadingTemplate {
    tag: &'static str,
    class: String,
    children: String,
}

#[derive(Template)]
#[template(
    source = r#"<blockquote class="richtext-quote">{{ children|safe }}</blockquote>"#,
    ext = "html"
)]
struct QuoteTemplate {
    children: String,
}

pub struct ParagraphRenderer;

impl NodeRenderer for ParagraphRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[node_types::PARAGRAPH]
    }

    fn render<'a>(&self, node: &'a Node, ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        let Node::Paragraph(paragraph) = node else {
            return Err(RenderError::shape("paragraph", node));
        };
        // Empty paragraphs are how editors express vertical spacing.
        if paragraph.children.is_empty() {
            return Ok(LINE_BREAK.to_string());
        }
        Ok(ParagraphTemplate {
            class: Alignment::from_format(&paragraph.format).class(),
            children: ctx.render_children(node)?,
        }
        .render()?)
    }
}

pub struct HeadingRenderer;

impl HeadingRenderer {
    fn level(tag: &str) -> Option<(&'static str, u8)> {
        match tag {
            "h1" => Some(("h1", 1)),
            "h2" => Some(("h2", 2)),
            "h3" => Some(("h3", 3)),
            "h4" => Some(("h4", 4)),
            "h5" => Some(("h5", 5)),
            "h6" => Some(("h6", 6)),
            _ => None,
        }
    }
}

impl NodeRenderer for HeadingRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[node_types::HEADING]
    }

    fn render<'a>(&self, node: &'a Node, ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        let Node::Heading(heading) = node else {
            return Err(RenderError::shape("heading", node));
        };
        let children = ctx.render_children(node)?;

        let Some((tag, level)) = Self::level(&heading.tag) else {
            return Ok(children);
        };

        let mut class = Alignment::from_format(&heading.format).class().to_string();
        if level >= 3 {
            class.push_str(" font-semibold");
        }
        Ok(HeadingTemplate {
            tag,
            class,
            children,
        }
        .render()?)
    }
}

pub struct LinebreakRenderer;

impl NodeRenderer for LinebreakRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[node_types::LINEBREAK]
    }

    fn render<'a>(&self, _node: &'a Node, _ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        Ok(LINE_BREAK.to_string())
    }
}

pub struct QuoteRenderer;

impl NodeRenderer for QuoteRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[node_types::QUOTE]
    }

    fn render<'a>(&self, node: &'a Node, ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        if !matches!(node, Node::Quote(_)) {
            return Err(RenderError::shape("quote", node));
        }
        Ok(QuoteTemplate {
            children: ctx.render_children(node)?,
        }
        .render()?)
    }
}

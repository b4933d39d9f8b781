use askama::Template;

use crate::application::richtext::context::RenderContext;
use crate::application::richtext::markup::escape;
use crate::application::richtext::registry::NodeRenderer;
use crate::application::richtext::types::RenderError;
use crate::domain::richtext::{Node, TextFormat, node_types};

/// Wrappers applied for each format bit, innermost first.
const FORMAT_TAGS: [(TextFormat, &str); 8] = [
    (TextFormat::BOLD, "strong"),
    (TextFormat::ITALIC, "em"),
    (TextFormat::STRIKETHROUGH, "s"),
    (TextFormat::UNDERLINE, "u"),
    (TextFormat::CODE, "code"),
    (TextFormat::SUBSCRIPT, "sub"),
    (TextFormat::SUPERSCRIPT, "sup"),
    (TextFormat::HIGHLIGHT, "mark"),
];

/// Preset visual treatments selectable on a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightVariant {
    Flat,
    Gradient,
    Underline,
}

impl HighlightVariant {
    pub fn parse(raw: &str) -> Result<Self, RenderError> {
        match raw {
            "flat" => Ok(Self::Flat),
            "gradient" => Ok(Self::Gradient),
            "underline" => Ok(Self::Underline),
            other => Err(RenderError::UnknownHighlightVariant {
                variant: other.to_string(),
            }),
        }
    }

    fn render(self, text: &str) -> Result<String, RenderError> {
        let html = match self {
            Self::Flat => FlatHighlight { text }.render()?,
            Self::Gradient => GradientHighlight { text }.render()?,
            Self::Underline => UnderlineHighlight { text }.render()?,
        };
        Ok(html)
    }
}

#[derive(Template)]
#[template(source = r#"<mark class="highlight-flat">{{ text }}</mark>"#, ext = "html")]
struct FlatHighlight<'a> {
    text: &'a str,
}

#[derive(Template)]
#[template(source = r#"<span class="highlight-gradient">{{ text }}</span>"#, ext = "html")]
struct GradientHighlight<'a> {
    text: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<span class="highlight-underline">{{ text }}<svg class="highlight-underline-mark" aria-hidden="true" focusable="false" viewBox="0 0 120 8" preserveAspectRatio="none"><path d="M1 5.5C30 2 90 2 119 5.5" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round"/></svg></span>"#,
    ext = "html"
)]
struct UnderlineHighlight<'a> {
    text: &'a str,
}

/// Renders `text` nodes: a highlight variant if one is set, otherwise the
/// escaped text wrapped once per active format flag.
pub struct TextRenderer;

impl NodeRenderer for TextRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[node_types::TEXT]
    }

    fn render<'a>(&self, node: &'a Node, _ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        let Node::Text(text) = node else {
            return Err(RenderError::shape("text", node));
        };

        // A blank variant is what the CMS stores after the select is cleared.
        if let Some(variant) = text.highlight.as_deref().filter(|v| !v.is_empty()) {
            return HighlightVariant::parse(variant)?.render(&text.text);
        }

        let mut html = escape(&text.text)?;
        for (flag, tag) in FORMAT_TAGS {
            if text.format.contains(flag) {
                html = format!("<{tag}>{html}</{tag}>");
            }
        }
        Ok(html)
    }
}

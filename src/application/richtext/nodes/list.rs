use askama::Template;

use crate::application::richtext::context::RenderContext;
use crate::application::richtext::registry::NodeRenderer;
use crate::application::richtext::types::RenderError;
use crate::domain::richtext::{Node, node_types};

#[derive(Template)]
#[template(
    source = r#"<{{ tag }} class="{{ class }}"{% if start != 1 %} start="{{ start }}"{% endif %}>{{ children|safe }}</{{ tag }}>"#,
    ext = "html"
)]
struct ListTemplate {
    tag: &'static str,
    class: &'static str,
    start: u32,
    children: String,
}

#[derive(Template)]
#[template(
    source = r#"<li role="checkbox" tabindex="-1" aria-checked="{{ checked }}" value="{{ value }}" class="list-item-check{% if checked %} list-item-checked{% endif %}"><span class="list-item-check-indicator" aria-hidden="true"></span>{{ children|safe }}</li>"#,
    ext = "html"
)]
struct CheckItemTemplate {
    checked: bool,
    value: u32,
    children: String,
}

#[derive(Template)]
#[template(source = r#"<li value="{{ value }}">{{ children|safe }}</li>"#, ext = "html")]
struct ItemTemplate {
    value: u32,
    children: String,
}

pub struct ListRenderer;

impl NodeRenderer for ListRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[node_types::LIST]
    }

    fn render<'a>(&self, node: &'a Node, ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        let Node::List(list) = node else {
            return Err(RenderError::shape("list", node));
        };
        let ordered = list.tag == "ol" && !list.is_check_list();
        let (tag, class) = match (ordered, list.is_check_list()) {
            (true, _) => ("ol", "list-number"),
            (false, true) => ("ul", "list-check"),
            (false, false) => ("ul", "list-bullet"),
        };
        Ok(ListTemplate {
            tag,
            class,
            start: if ordered { list.start.unwrap_or(1) } else { 1 },
            children: ctx.render_children(node)?,
        }
        .render()?)
    }
}

/// Renders `listitem` nodes; items of a check list become checkboxes.
pub struct ListItemRenderer;

impl NodeRenderer for ListItemRenderer {
    fn node_types(&self) -> &'static [&'static str] {
        &[node_types::LIST_ITEM]
    }

    fn render<'a>(&self, node: &'a Node, ctx: &RenderContext<'a>) -> Result<String, RenderError> {
        let Node::ListItem(item) = node else {
            return Err(RenderError::shape("listitem", node));
        };
        let in_check_list = matches!(ctx.parent(), Some(Node::List(list)) if list.is_check_list());
        let children = ctx.render_children(node)?;

        let html = if in_check_list {
            CheckItemTemplate {
                checked: item.checked.unwrap_or(false),
                value: item.value,
                children,
            }
            .render()?
        } else {
            ItemTemplate {
                value: item.value,
                children,
            }
            .render()?
        };
        Ok(html)
    }
}

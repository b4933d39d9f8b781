use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};

use super::*;
use crate::domain::richtext::{Document, Node};

fn document(children: Value) -> Document {
    serde_json::from_value(json!({"root": {"type": "root", "children": children}}))
        .expect("document parses")
}

fn render(children: Value) -> String {
    RichTextRenderer::default()
        .render(&document(children), None)
        .expect("render succeeds")
        .expect("document has content")
}

fn text(value: &str, format: u32) -> Value {
    json!({"type": "text", "text": value, "format": format, "version": 1})
}

fn paragraph(children: Value) -> Value {
    json!({"type": "paragraph", "format": "", "version": 1, "children": children})
}

#[test]
fn empty_document_renders_nothing() {
    let rendered = RichTextRenderer::default()
        .render(&document(json!([])), None)
        .unwrap();
    assert_eq!(rendered, None);
}

#[test]
fn rendering_is_deterministic() {
    let children = json!([
        {"type": "heading", "tag": "h2", "children": [text("Title", 1)]},
        paragraph(json!([text("Body", 0), {"type": "linebreak"}, text("more", 2)])),
    ]);
    assert_eq!(render(children.clone()), render(children));
}

#[test]
fn heading_and_paragraph_snapshot() {
    let html = render(json!([
        {"type": "heading", "tag": "h2", "format": "center", "children": [text("Hello", 1)]},
        paragraph(json!([text("Plain", 0), {"type": "linebreak", "version": 1}, text("next", 2)])),
    ]));
    insta::assert_snapshot!(html, @r#"<h2 class="text-center"><strong>Hello</strong></h2><p class="text-left">Plain<br /><em>next</em></p>"#);
}

#[test]
fn every_format_flag_adds_its_wrapper_innermost_first() {
    let html = render(json!([text("x", 255)]));
    assert_eq!(
        html,
        "<mark><sup><sub><code><u><s><em><strong>x</strong></em></s></u></code></sub></sup></mark>"
    );
}

#[test]
fn single_flags_map_to_their_elements() {
    for (flag, tag) in [
        (1, "strong"),
        (2, "em"),
        (4, "s"),
        (8, "u"),
        (16, "code"),
        (32, "sub"),
        (64, "sup"),
        (128, "mark"),
    ] {
        assert_eq!(render(json!([text("x", flag)])), format!("<{tag}>x</{tag}>"));
    }
}

#[test]
fn text_is_escaped() {
    let html = render(json!([text("<script>", 0)]));
    assert_eq!(html, "&lt;script&gt;");
}

#[test]
fn highlight_variant_overrides_format() {
    assert_eq!(
        render(json!([{"type": "text", "text": "Hi", "format": 1, "highlight": "flat"}])),
        r#"<mark class="highlight-flat">Hi</mark>"#
    );
    assert_eq!(
        render(json!([{"type": "text", "text": "Hi", "highlight": "gradient"}])),
        r#"<span class="highlight-gradient">Hi</span>"#
    );

    let underline = render(json!([{"type": "text", "text": "Hi", "highlight": "underline"}]));
    assert!(underline.starts_with(r#"<span class="highlight-underline">Hi<svg"#));
    assert!(underline.contains(r#"aria-hidden="true""#));
    assert!(underline.ends_with("</svg></span>"));
}

#[test]
fn unknown_highlight_variant_fails_the_render() {
    let err = RichTextRenderer::default()
        .render(
            &document(json!([{"type": "text", "text": "Hi", "highlight": "neon"}])),
            None,
        )
        .unwrap_err();
    assert_eq!(
        err,
        RenderError::UnknownHighlightVariant {
            variant: "neon".into()
        }
    );
}

#[test]
fn empty_paragraph_is_a_line_break() {
    assert_eq!(render(json!([paragraph(json!([]))])), "<br />");
}

#[test]
fn paragraph_alignment_classes() {
    for (format, class) in [
        ("left", "text-left"),
        ("center", "text-center"),
        ("right", "text-right"),
        ("justify", "text-justify"),
        ("", "text-left"),
    ] {
        let html = render(json!([
            {"type": "paragraph", "format": format, "children": [text("a", 0)]}
        ]));
        assert_eq!(html, format!(r#"<p class="{class}">a</p>"#));
    }
}

#[test]
fn headings_map_one_to_one() {
    for level in 1..=6 {
        let html = render(json!([
            {"type": "heading", "tag": format!("h{level}"), "children": [text("T", 0)]}
        ]));
        let class = if level >= 3 {
            "text-left font-semibold"
        } else {
            "text-left"
        };
        assert_eq!(html, format!(r#"<h{level} class="{class}">T</h{level}>"#));
    }
}

#[test]
fn unexpected_heading_tag_leaves_children_unwrapped() {
    let html = render(json!([
        {"type": "heading", "tag": "h7", "children": [text("T", 1)]}
    ]));
    assert_eq!(html, "<strong>T</strong>");
}

#[test]
fn custom_link_opens_in_new_tab() {
    let html = render(json!([paragraph(json!([{
        "type": "link",
        "fields": {"linkType": "custom", "url": "https://x.test", "newTab": true},
        "children": [text("Go", 0)]
    }]))]));
    assert_eq!(
        html,
        r#"<p class="text-left"><a href="https://x.test" target="_blank" rel="noopener noreferrer">Go</a></p>"#
    );
}

#[test]
fn internal_link_uses_reference_id() {
    let html = render(json!([{
        "type": "link",
        "fields": {"linkType": "internal", "doc": {"relationTo": "pages", "value": 42}},
        "children": [text("Doc", 0)]
    }]));
    assert_eq!(html, r#"<a href="42">Doc</a>"#);
}

#[test]
fn internal_link_with_slug_resolver() {
    let renderer =
        RichTextRenderer::default().with_resolver(Arc::new(SlugPathResolver::new("en")));
    let doc = document(json!([{
        "type": "link",
        "fields": {"linkType": "internal", "doc": {"relationTo": "pages", "value": {"id": "9", "slug": "about"}}},
        "children": [text("About", 0)]
    }]));
    assert_eq!(
        renderer.render(&doc, None).unwrap().unwrap(),
        r#"<a href="/en/about">About</a>"#
    );
}

#[test]
fn link_without_destination_falls_back_to_hash() {
    let html = render(json!([{
        "type": "link",
        "fields": {"linkType": "custom"},
        "children": [text("Nowhere", 0)]
    }]));
    assert_eq!(html, r##"<a href="#">Nowhere</a>"##);
}

#[test]
fn submission_data_fills_link_placeholders() {
    let doc = document(json!([{
        "type": "link",
        "fields": {"linkType": "custom", "url": "/thanks?name={{name}}&ref={{ref}}"},
        "children": [text("Next", 0)]
    }]));
    let data = HashMap::from([("name".to_string(), "Ana".to_string())]);
    let html = RichTextRenderer::default()
        .render(&doc, Some(&data))
        .unwrap()
        .unwrap();
    assert!(html.contains("name=Ana"));
    assert!(html.contains("{{ref}}"));
}

#[test]
fn script_links_are_neutralised() {
    let html = render(json!([{
        "type": "link",
        "fields": {"linkType": "custom", "url": "javascript:alert(1)"},
        "children": [text("x", 0)]
    }]));
    assert_eq!(html, r##"<a href="#">x</a>"##);
}

#[test]
fn lists_render_by_kind() {
    let item = |value: u32| json!({"type": "listitem", "value": value, "children": [text("i", 0)]});

    assert_eq!(
        render(json!([{"type": "list", "tag": "ul", "listType": "bullet", "children": [item(1)]}])),
        r#"<ul class="list-bullet"><li value="1">i</li></ul>"#
    );
    assert_eq!(
        render(json!([{"type": "list", "tag": "ol", "listType": "number", "start": 3, "children": [item(3)]}])),
        r#"<ol class="list-number" start="3"><li value="3">i</li></ol>"#
    );
}

#[test]
fn check_list_items_render_as_checkboxes() {
    let html = render(json!([{
        "type": "list",
        "tag": "ul",
        "listType": "check",
        "children": [
            {"type": "listitem", "value": 1, "checked": true, "children": [text("done", 0)]},
            {"type": "listitem", "value": 2, "children": [text("todo", 0)]}
        ]
    }]));
    assert!(html.starts_with(r#"<ul class="list-check">"#));
    assert!(html.contains(r#"role="checkbox""#));
    assert!(html.contains(r#"aria-checked="true""#));
    assert!(html.contains(r#"aria-checked="false""#));
    assert_eq!(html.matches("list-item-check-indicator").count(), 2);
}

#[test]
fn nested_list_items_follow_their_own_parent() {
    let html = render(json!([{
        "type": "list",
        "tag": "ul",
        "listType": "check",
        "children": [{
            "type": "listitem",
            "value": 1,
            "children": [{
                "type": "list",
                "tag": "ol",
                "listType": "number",
                "children": [{"type": "listitem", "value": 1, "children": [text("inner", 0)]}]
            }]
        }]
    }]));
    assert!(html.contains(r#"<ol class="list-number"><li value="1">inner</li></ol>"#));
}

#[test]
fn quote_and_coral_highlight() {
    assert_eq!(
        render(json!([{"type": "quote", "children": [text("q", 0)]}])),
        r#"<blockquote class="richtext-quote">q</blockquote>"#
    );
    assert_eq!(
        render(json!([{"type": "coral-highlight", "children": [text("c", 0)]}])),
        r#"<span class="coral-highlight">c</span>"#
    );
}

#[test]
fn unknown_node_renders_placeholder_and_keeps_siblings() {
    let html = render(json!([
        {"type": "upload", "version": 1, "value": {"id": 3}},
        paragraph(json!([text("after", 0)])),
    ]));
    assert_eq!(
        html,
        r#"<span class="richtext-unknown" role="note" data-node-type="upload">Unsupported content: upload</span><p class="text-left">after</p>"#
    );
}

#[test]
fn malformed_node_renders_placeholder() {
    let html = render(json!([{"type": "heading", "tag": 5, "children": []}]));
    assert!(html.contains(r#"data-node-type="heading""#));
}

#[test]
fn renderer_receives_unexpected_node_shape() {
    struct Misregistered;

    impl NodeRenderer for Misregistered {
        fn node_types(&self) -> &'static [&'static str] {
            &["callout"]
        }

        fn render<'a>(
            &self,
            node: &'a Node,
            ctx: &RenderContext<'a>,
        ) -> Result<String, RenderError> {
            nodes::TextRenderer.render(node, ctx)
        }
    }

    let renderer = RichTextRenderer::new(Arc::new(
        RendererRegistry::builder().with(Misregistered).build(),
    ));
    let err = renderer
        .render(&document(json!([{"type": "callout", "children": []}])), None)
        .unwrap_err();
    assert!(matches!(err, RenderError::NodeShape { renderer: "text", .. }));
}

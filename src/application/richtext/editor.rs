//! Authoring command for the `coral-highlight` inline wrapper.
//!
//! Offsets count characters of the flattened inline text of one block, with a
//! line break counting as a single character.

use crate::domain::richtext::{CustomNode, Node, TextNode, node_types};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub start: usize,
    pub end: usize,
}

impl TextSelection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start >= self.end
    }
}

/// Toggle the highlight wrapper over `selection`.
///
/// A selection lying entirely inside existing highlights unwraps them;
/// anything else wraps the selected run in a single new highlight.
pub fn toggle_highlight(children: &[Node], selection: TextSelection) -> Vec<Node> {
    let spans = measure(children);
    let total = spans.last().map_or(0, |&(_, end)| end);
    let start = selection.start.min(total);
    let end = selection.end.min(total);
    if start >= end {
        return children.to_vec();
    }

    let touched: Vec<usize> = spans
        .iter()
        .enumerate()
        .filter(|(_, (s, e))| s < e && *s < end && *e > start)
        .map(|(position, _)| position)
        .collect();
    if touched.is_empty() {
        return children.to_vec();
    }

    if touched.iter().all(|&position| is_highlight(&children[position])) {
        unwrap(children, &touched)
    } else {
        wrap(children, &spans, start, end)
    }
}

fn is_highlight(node: &Node) -> bool {
    node.node_type() == node_types::CORAL_HIGHLIGHT
}

fn measure(children: &[Node]) -> Vec<(usize, usize)> {
    let mut offset = 0;
    children
        .iter()
        .map(|node| {
            let start = offset;
            offset += node.text_content().chars().count();
            (start, offset)
        })
        .collect()
}

fn unwrap(children: &[Node], touched: &[usize]) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    for (position, node) in children.iter().enumerate() {
        if touched.contains(&position) {
            out.extend(node.children().iter().cloned());
        } else {
            out.push(node.clone());
        }
    }
    out
}

fn wrap(children: &[Node], spans: &[(usize, usize)], start: usize, end: usize) -> Vec<Node> {
    let mut before = Vec::new();
    let mut selected = Vec::new();
    let mut after = Vec::new();

    for (node, &(node_start, node_end)) in children.iter().zip(spans) {
        if node_end <= start {
            before.push(node.clone());
            continue;
        }
        if node_start >= end {
            after.push(node.clone());
            continue;
        }

        match node {
            Node::Text(text) => {
                let chars: Vec<char> = text.text.chars().collect();
                let cut_start = start.saturating_sub(node_start).min(chars.len());
                let cut_end = (end - node_start).min(chars.len());
                if cut_start > 0 {
                    before.push(split(text, &chars[..cut_start]));
                }
                selected.push(split(text, &chars[cut_start..cut_end]));
                if cut_end < chars.len() {
                    after.push(split(text, &chars[cut_end..]));
                }
            }
            other if is_highlight(other) => selected.extend(other.children().iter().cloned()),
            other => selected.push(other.clone()),
        }
    }

    before.push(Node::Custom(CustomNode::new(
        node_types::CORAL_HIGHLIGHT,
        selected,
    )));
    before.extend(after);
    before
}

fn split(template: &TextNode, chars: &[char]) -> Node {
    Node::Text(TextNode {
        text: chars.iter().collect(),
        ..template.clone()
    })
}

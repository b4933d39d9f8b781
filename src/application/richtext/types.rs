use std::collections::HashMap;

use thiserror::Error;

use crate::domain::richtext::Node;

/// Values captured from a form submission, substituted into link targets.
pub type SubmissionData = HashMap<String, String>;

/// Errors that abort a rich-text render.
///
/// Missing renderers and malformed nodes are not errors: they degrade to a
/// placeholder. What remains signals a renderer/content version mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown text highlight variant `{variant}`")]
    UnknownHighlightVariant { variant: String },
    #[error("renderer `{renderer}` cannot handle node of type `{node_type}`")]
    NodeShape {
        renderer: &'static str,
        node_type: String,
    },
    #[error("template rendering failed: {message}")]
    Template { message: String },
}

impl RenderError {
    pub(crate) fn shape(renderer: &'static str, node: &Node) -> Self {
        Self::NodeShape {
            renderer,
            node_type: node.node_type().to_string(),
        }
    }
}

impl From<askama::Error> for RenderError {
    fn from(err: askama::Error) -> Self {
        Self::Template {
            message: err.to_string(),
        }
    }
}

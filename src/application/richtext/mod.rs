//! Rich-text rendering.
//!
//! A document is rendered by walking its node tree and routing each node to
//! the [`NodeRenderer`] registered for its type. Renderers recurse into
//! children through the [`RenderContext`] they are handed, which tracks the
//! parent node so context-dependent nodes (check list items) can adapt.

mod context;
pub mod editor;
mod markup;
pub mod nodes;
mod registry;
mod resolve;
mod service;
mod types;

pub use context::{RenderContext, dispatch, render_children, render_document};
pub use markup::substitute_placeholders;
pub use registry::{NodeRenderer, RegistryBuilder, RendererRegistry};
pub use resolve::{RawIdResolver, ReferenceResolver, SlugPathResolver};
pub use service::RichTextRenderer;
pub use types::{RenderError, SubmissionData};

#[cfg(test)]
mod tests;

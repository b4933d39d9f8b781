//! coralpress: a localized marketing site server.
//!
//! Pages are page-builder documents whose blocks carry CMS rich text. Rendered
//! pages are cached per path and dropped again through `POST /api/revalidate`
//! when the CMS reports a write.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;

use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::{ErrorReport, HttpError};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(locale: &str) -> Response {
    let template = NotFoundTemplate {
        view: ErrorPageView::not_found(locale),
    };
    let mut response = render_template_response(template, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// A fully rendered page, ready for the layout.
#[derive(Debug, Clone)]
pub struct PageView {
    pub locale: String,
    pub title: String,
    pub description: String,
    /// Rendered block fragments in page order.
    pub blocks: Vec<String>,
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub view: PageView,
}

pub struct ErrorPageView {
    pub locale: String,
    pub title: String,
    pub message: String,
    pub home_href: String,
}

impl ErrorPageView {
    pub fn not_found(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
            home_href: format!("/{locale}"),
        }
    }
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub view: ErrorPageView,
}

#[derive(Template)]
#[template(path = "blocks/hero.html")]
pub struct HeroBlockTemplate<'a> {
    pub heading: &'a str,
    pub subheading: &'a str,
    pub body_html: String,
}

#[derive(Template)]
#[template(path = "blocks/content.html")]
pub struct ContentBlockTemplate {
    pub body_html: String,
}

pub struct TeamMemberView {
    pub name: String,
    pub role: String,
    pub bio_html: String,
}

#[derive(Template)]
#[template(path = "blocks/team_grid.html")]
pub struct TeamGridBlockTemplate<'a> {
    pub heading: &'a str,
    pub members: Vec<TeamMemberView>,
}

pub struct TestimonialView {
    pub quote: String,
    pub author: String,
    pub role: String,
}

#[derive(Template)]
#[template(path = "blocks/testimonials.html")]
pub struct TestimonialsBlockTemplate<'a> {
    pub heading: &'a str,
    pub items: Vec<TestimonialView>,
}

pub struct TimelineEntryView {
    pub date: String,
    pub title: String,
    pub body_html: String,
}

#[derive(Template)]
#[template(path = "blocks/timeline.html")]
pub struct TimelineBlockTemplate<'a> {
    pub heading: &'a str,
    pub entries: Vec<TimelineEntryView>,
}

#[derive(Template)]
#[template(path = "blocks/unsupported.html")]
pub struct UnsupportedBlockTemplate<'a> {
    pub block_type: &'a str,
}

/// Marker shown in place of a block that failed to render.
pub fn block_error_marker(block_kind: &'static str) -> String {
    format!(
        "<div class=\"block block-error\" role=\"alert\" data-block-type=\"{block_kind}\">\
         This section could not be displayed.</div>"
    )
}

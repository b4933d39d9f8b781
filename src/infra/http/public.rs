use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::{
    application::pages::PageService,
    cache::{CacheState, response_cache_layer},
    domain::content::{HOME_SLUG, validate_segment},
    presentation::views::{PageTemplate, render_not_found_response, render_template_response},
};

use super::{
    middleware::{log_responses, set_request_context},
    revalidate::{REVALIDATE_PATH, revalidate},
};

#[derive(Clone)]
pub struct HttpState {
    pub pages: Arc<PageService>,
    pub cache: CacheState,
    pub revalidate_secret: Option<Arc<str>>,
    pub default_locale: Arc<str>,
}

pub fn build_router(state: HttpState) -> Router {
    // Public pages, served through the response cache
    let cached_routes = Router::new()
        .route("/{locale}", get(locale_home))
        .route("/{locale}/{slug}", get(page))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.cache.clone(),
            response_cache_layer,
        ));

    let uncached_routes = Router::new()
        .route("/", get(root_redirect))
        .route("/_health", get(health))
        .route(REVALIDATE_PATH, post(revalidate));

    cached_routes
        .merge(uncached_routes)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn root_redirect(State(state): State<HttpState>) -> Redirect {
    Redirect::temporary(&format!("/{}", state.default_locale))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn locale_home(State(state): State<HttpState>, Path(locale): Path<String>) -> Response {
    serve_page(&state, &locale, HOME_SLUG).await
}

async fn page(
    State(state): State<HttpState>,
    Path((locale, slug)): Path<(String, String)>,
) -> Response {
    serve_page(&state, &locale, &slug).await
}

async fn not_found(State(state): State<HttpState>, uri: Uri) -> Response {
    let locale = uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    render_not_found_response(not_found_locale(&state, locale))
}

async fn serve_page(state: &HttpState, locale: &str, slug: &str) -> Response {
    match state.pages.render_page(locale, slug).await {
        Ok(Some(view)) => render_template_response(PageTemplate { view }, StatusCode::OK),
        Ok(None) => render_not_found_response(not_found_locale(state, locale)),
        Err(err) => err.into_response(),
    }
}

fn not_found_locale<'a>(state: &'a HttpState, requested: &'a str) -> &'a str {
    if validate_segment("locale", requested).is_ok() {
        requested
    } else {
        state.default_locale.as_ref()
    }
}

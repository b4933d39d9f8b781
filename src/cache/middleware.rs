//! Response cache middleware for public pages.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument, warn};

use super::{
    CacheConfig, DependencyRegistry, Invalidator, ResponseStore, deps,
    keys::{CacheKey, Dependency},
    store::{CachedResponse, Lookup},
};

const MAX_CACHED_BODY: usize = 1024 * 1024;

/// Response header reporting whether the cache answered.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

/// Shared cache state for middleware and the revalidation endpoint.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub store: Arc<ResponseStore>,
    pub registry: Arc<DependencyRegistry>,
}

impl CacheState {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            store: Arc::new(ResponseStore::from_config(&config)),
            registry: Arc::new(DependencyRegistry::new()),
            config,
        }
    }

    pub fn invalidator(&self) -> Invalidator {
        Invalidator::new(self.store.clone(), self.registry.clone())
    }
}

/// Serve GET requests from the cache and store fresh `200 OK` responses.
///
/// The handler runs inside a dependency collector; the stored entry is
/// registered under what it recorded plus its own path. A response rendered
/// across an invalidation is returned but never stored.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = CacheKey::new(request.uri().path(), request.uri().query());

    match cache.store.lookup(&key) {
        Lookup::Fresh(cached) => {
            debug!(target = "coralpress::cache", outcome = "hit", "serving cached response");
            return build_response(cached);
        }
        Lookup::Expired => cache.registry.unregister(&key),
        Lookup::Absent => {}
    }

    let epoch = cache.registry.epoch();
    debug!(target = "coralpress::cache", outcome = "miss", "cache miss, executing handler");

    let (response, mut recorded) = deps::with_collector(next.run(request)).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(
                target = "coralpress::cache",
                error = %err,
                "failed to buffer response body for caching"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let headers = parts
        .headers
        .iter()
        .filter(|(name, _)| *name != header::SET_COOKIE)
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect();

    recorded.insert(Dependency::path(&key.path));
    debug!(
        target = "coralpress::cache",
        deps_count = recorded.len(),
        "caching response"
    );

    let cached = CachedResponse::new(parts.status.as_u16(), headers, bytes.clone());
    if let Some(evicted) = cache.store.insert(key.clone(), cached) {
        cache.registry.unregister(&evicted);
    }
    if !cache.registry.register_if_current(key.clone(), recorded, epoch) {
        cache.store.remove(&key);
        debug!(
            target = "coralpress::cache",
            "content invalidated while rendering, response not kept"
        );
    }

    parts
        .headers
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("miss"));
    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);
    for (name, value) in cached.headers {
        if let Ok(value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, value);
        }
    }
    builder
        .header(CACHE_STATUS_HEADER, HeaderValue::from_static("hit"))
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

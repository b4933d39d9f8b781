use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::Path,
    http::{Method, Request, StatusCode},
    middleware,
    routing::get,
};
use coralpress::application::richtext::RichTextRenderer;
use coralpress::cache::{
    CacheConfig, CacheState, DependencyRegistry, ResponseStore, deps, response_cache_layer,
};
use coralpress::cache::{Dependency, Invalidator};
use coralpress::domain::richtext::Document;
use metrics_util::debugging::DebuggingRecorder;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn cache_and_render_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Hit, miss and capacity eviction through the middleware
    let config = CacheConfig {
        response_limit: 1,
        ..Default::default()
    };
    let store = Arc::new(ResponseStore::new(
        NonZeroUsize::MIN,
        config.ttl(),
    ));
    let registry = Arc::new(DependencyRegistry::new());
    let cache_state = CacheState {
        config,
        store: store.clone(),
        registry: registry.clone(),
    };

    let app = Router::new()
        .route(
            "/en/{slug}",
            get(|Path(slug): Path<String>| async move {
                deps::record(Dependency::tag(format!("page:en:{slug}")));
                StatusCode::OK
            }),
        )
        .layer(middleware::from_fn_with_state(
            cache_state,
            response_cache_layer,
        ));

    for uri in ["/en/one", "/en/one", "/en/two"] {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Invalidation
    let dropped = Invalidator::new(store, registry)
        .invalidate_dependency(&Dependency::tag("page:en:two"));
    assert_eq!(dropped, 1);

    // Placeholder rendering of an unknown node
    let document: Document = serde_json::from_value(json!({
        "root": {"children": [{"type": "upload", "value": {"id": "9"}}]}
    }))
    .expect("document parses");
    RichTextRenderer::default()
        .render(&document, None)
        .expect("unknown nodes degrade");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "coralpress_cache_hit_total",
        "coralpress_cache_miss_total",
        "coralpress_cache_evict_total",
        "coralpress_cache_invalidated_total",
        "coralpress_richtext_unrendered_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}

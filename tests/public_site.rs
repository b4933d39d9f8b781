//! End-to-end tests for the public router: page rendering, the response cache
//! and `POST /api/revalidate`, backed by a filesystem content fixture.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, LOCATION},
    },
    response::Response,
};
use coralpress::{
    application::{
        pages::PageService,
        revalidation::{ContentChange, HookReport, RevalidationClient, RevalidationHook},
        richtext::RichTextRenderer,
    },
    cache::{CACHE_STATUS_HEADER, CacheConfig, CacheState},
    infra::{
        content::FsContentRepo,
        http::{HttpState, build_router},
    },
};
use reqwest::Url;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

struct Site {
    dir: TempDir,
    router: Router,
    cache: CacheState,
}

fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("fixture dir");
    }
    fs::write(path, serde_json::to_vec_pretty(value).expect("json")).expect("fixture file");
}

fn member(id: &str, name: &str) -> Value {
    json!({"id": id, "name": name, "role": "Engineer"})
}

fn site_with_secret(secret: Option<&str>) -> Site {
    let dir = TempDir::new().expect("tempdir");
    write_json(
        &dir.path().join("pages/en/about.json"),
        &json!({
            "slug": "about",
            "locale": "en",
            "title": "About",
            "description": "Who we are",
            "blocks": [
                {"blockType": "hero", "heading": "Meet the team"},
                {"blockType": "teamGrid", "heading": "People"},
                {"blockType": "content", "richText": {"root": {"children": [
                    {"type": "paragraph", "children": [
                        {"type": "link", "fields": {
                            "linkType": "internal",
                            "doc": {"relationTo": "pages", "value": {"id": "12", "slug": "contact"}}
                        }, "children": [{"type": "text", "text": "Contact us"}]}
                    ]}
                ]}}}
            ]
        }),
    );
    write_json(
        &dir.path().join("pages/en/home.json"),
        &json!({"slug": "home", "locale": "en", "title": "Home", "blocks": [
            {"blockType": "hero", "heading": "Welcome", "subheading": "Glad you're here"}
        ]}),
    );
    write_json(
        &dir.path().join("team-members.json"),
        &json!([member("1", "Ana")]),
    );

    let repo = Arc::new(FsContentRepo::new(dir.path()));
    let pages = Arc::new(PageService::new(repo, RichTextRenderer::default()));
    let cache = CacheState::new(CacheConfig::default());
    let router = build_router(HttpState {
        pages,
        cache: cache.clone(),
        revalidate_secret: secret.map(Arc::from),
        default_locale: Arc::from("en"),
    });

    Site { dir, router, cache }
}

fn site() -> Site {
    site_with_secret(Some(SECRET))
}

async fn get(router: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

async fn revalidate(router: &Router, token: Option<&str>, body: &str) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/revalidate")
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .expect("request should build");
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should buffer");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}

fn cache_status(response: &Response) -> &str {
    response
        .headers()
        .get(CACHE_STATUS_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn root_redirects_to_default_locale() {
    let site = site();
    let response = get(&site.router, "/").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[LOCATION], "/en");
}

#[tokio::test]
async fn locale_root_serves_home_page() {
    let site = site();
    let response = get(&site.router, "/en").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Welcome"));
    assert!(html.contains("Glad you&#39;re here") || html.contains("Glad you&#x27;re here"));
}

#[tokio::test]
async fn page_renders_blocks_and_resolves_internal_links() {
    let site = site();
    let response = get(&site.router, "/en/about").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<title>About</title>"));
    assert!(html.contains("Meet the team"));
    assert!(html.contains("Ana"));
    assert!(html.contains(r#"<a href="/en/contact">Contact us</a>"#));
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let site = site();
    let first = get(&site.router, "/en/about").await;
    assert_eq!(cache_status(&first), "miss");
    let first_body = body_text(first).await;

    let second = get(&site.router, "/en/about").await;
    assert_eq!(cache_status(&second), "hit");
    assert_eq!(body_text(second).await, first_body);
}

#[tokio::test]
async fn missing_page_is_404_and_not_cached() {
    let site = site();
    for _ in 0..2 {
        let response = get(&site.router, "/en/nowhere").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_ne!(cache_status(&response), "hit");
    }
    assert!(site.cache.store.is_empty());
}

#[tokio::test]
async fn team_member_edit_shows_after_tag_revalidation() {
    let site = site();
    assert!(body_text(get(&site.router, "/en/about").await).await.contains("Ana"));

    write_json(
        &site.dir.path().join("team-members.json"),
        &json!([member("1", "Ana"), member("2", "Ben")]),
    );

    let stale = get(&site.router, "/en/about").await;
    assert_eq!(cache_status(&stale), "hit");
    assert!(!body_text(stale).await.contains("Ben"));

    let response = revalidate(
        &site.router,
        Some(SECRET),
        r#"{"type":"tag","tag":"team-members"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"ok": true, "revalidated": {"type": "tag", "tag": "team-members"}})
    );

    let fresh = get(&site.router, "/en/about").await;
    assert_eq!(cache_status(&fresh), "miss");
    assert!(body_text(fresh).await.contains("Ben"));
}

/// Serve the site on an ephemeral port and return a write hook aimed at it.
async fn hook_for(site: &Site, secret: Option<&str>) -> RevalidationHook {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let router = site.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });

    let endpoint = Url::parse(&format!("http://{addr}/api/revalidate")).expect("endpoint url");
    let client = RevalidationClient::new(
        endpoint,
        secret.map(str::to_string),
        Duration::from_secs(5),
    )
    .expect("client builds");
    RevalidationHook::new(client)
}

#[tokio::test]
async fn team_member_save_hook_refreshes_pages_through_the_endpoint() {
    let site = site();
    assert!(body_text(get(&site.router, "/en/about").await).await.contains("Ana"));
    get(&site.router, "/en").await;

    write_json(
        &site.dir.path().join("team-members.json"),
        &json!([member("1", "Ana"), member("2", "Ben")]),
    );

    let report = hook_for(&site, Some(SECRET))
        .await
        .after_change(&ContentChange::TeamMemberSaved { id: "2".into() })
        .await;
    assert_eq!(
        report,
        HookReport {
            sent: 1,
            failed: 0,
            skipped: 0
        }
    );

    let fresh = get(&site.router, "/en/about").await;
    assert_eq!(cache_status(&fresh), "miss");
    assert!(body_text(fresh).await.contains("Ben"));
    assert_eq!(cache_status(&get(&site.router, "/en").await), "hit");
}

#[tokio::test]
async fn page_save_hook_drops_the_page_and_rejected_hooks_change_nothing() {
    let site = site();
    get(&site.router, "/en/about").await;

    let rejected = hook_for(&site, Some("wrong"))
        .await
        .after_change(&ContentChange::PageSaved {
            locale: "en".into(),
            slug: "about".into(),
        })
        .await;
    assert_eq!(rejected.failed, 2);
    assert_eq!(cache_status(&get(&site.router, "/en/about").await), "hit");

    let report = hook_for(&site, Some(SECRET))
        .await
        .after_change(&ContentChange::PageSaved {
            locale: "en".into(),
            slug: "about".into(),
        })
        .await;
    assert_eq!(report.sent, 2);
    assert_eq!(cache_status(&get(&site.router, "/en/about").await), "miss");
}

#[tokio::test]
async fn path_revalidation_drops_only_that_page() {
    let site = site();
    get(&site.router, "/en/about").await;
    get(&site.router, "/en").await;

    let response = revalidate(
        &site.router,
        Some(SECRET),
        r#"{"type":"path","path":"/en/about"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(cache_status(&get(&site.router, "/en/about").await), "miss");
    assert_eq!(cache_status(&get(&site.router, "/en").await), "hit");
}

#[tokio::test]
async fn team_tag_leaves_unrelated_pages_cached() {
    let site = site();
    get(&site.router, "/en").await;

    revalidate(
        &site.router,
        Some(SECRET),
        r#"{"type":"tag","tag":"team-members"}"#,
    )
    .await;

    assert_eq!(cache_status(&get(&site.router, "/en").await), "hit");
}

#[tokio::test]
async fn revalidate_rejects_missing_or_wrong_token() {
    let site = site();
    get(&site.router, "/en/about").await;

    for token in [None, Some("wrong")] {
        let response = revalidate(
            &site.router,
            token,
            r#"{"type":"path","path":"/en/about"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "error": "Unauthorized"})
        );
    }

    assert_eq!(cache_status(&get(&site.router, "/en/about").await), "hit");
}

#[tokio::test]
async fn revalidate_without_configured_secret_is_unauthorized() {
    let site = site_with_secret(None);
    let response = revalidate(&site.router, Some(""), r#"{"type":"tag","tag":"pages"}"#).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revalidate_reports_bad_payloads() {
    let site = site();
    let cases = [
        ("not json", "Invalid body"),
        (r#"{"type":"tag"}"#, "Missing tag"),
        (r#"{"type":"path","path":""}"#, "Missing path"),
        (r#"{"type":"everything"}"#, "Unknown type"),
        (r#"{"type":"tag","tag":5}"#, "Missing tag"),
        (r#"{"type":7}"#, "Unknown type"),
    ];

    for (body, error) in cases {
        let response = revalidate(&site.router, Some(SECRET), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_json(response).await, json!({"ok": false, "error": error}));
    }
}

#[tokio::test]
async fn health_is_not_cached() {
    let site = site();
    let response = get(&site.router, "/_health").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(site.cache.store.is_empty());
}

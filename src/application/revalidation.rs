//! Write hooks that tell the site which cached pages a CMS change affects.
//!
//! Hooks run after the write has committed. Delivery is best effort: each
//! request is sent once and failures are logged, never surfaced to the writer.

use std::time::Duration;

use coralpress_api_types::{InvalidationRequest, RevalidateResponse};
use reqwest::{Client, StatusCode, Url, header::AUTHORIZATION};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ChangeKind, RevalidateSettings};
use crate::domain::content::{cache_tags, page_path};
use crate::domain::error::DomainError;

/// A committed change to CMS content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentChange {
    PageSaved { locale: String, slug: String },
    PageDeleted { locale: String, slug: String },
    TeamMemberSaved { id: String },
    TeamMemberDeleted { id: String },
    GlobalSaved { slug: String },
}

impl ContentChange {
    /// Assemble a change from its kind and the fields that identify it.
    pub fn from_kind(
        kind: ChangeKind,
        locale: Option<&str>,
        slug: Option<&str>,
        id: Option<&str>,
    ) -> Result<Self, DomainError> {
        let page = || -> Result<(String, String), DomainError> {
            Ok((required(locale, "locale", kind)?, required(slug, "slug", kind)?))
        };
        Ok(match kind {
            ChangeKind::PageSaved => {
                let (locale, slug) = page()?;
                Self::PageSaved { locale, slug }
            }
            ChangeKind::PageDeleted => {
                let (locale, slug) = page()?;
                Self::PageDeleted { locale, slug }
            }
            ChangeKind::TeamMemberSaved => Self::TeamMemberSaved {
                id: required(id, "id", kind)?,
            },
            ChangeKind::TeamMemberDeleted => Self::TeamMemberDeleted {
                id: required(id, "id", kind)?,
            },
            ChangeKind::GlobalSaved => Self::GlobalSaved {
                slug: required(slug, "slug", kind)?,
            },
        })
    }

    /// Invalidations that make every page built from this content stale.
    pub fn invalidation_requests(&self) -> Vec<InvalidationRequest> {
        match self {
            Self::PageSaved { locale, slug } => vec![
                InvalidationRequest::tag(cache_tags::page(locale, slug)),
                InvalidationRequest::path(page_path(locale, slug)),
            ],
            Self::PageDeleted { locale, slug } => vec![
                InvalidationRequest::tag(cache_tags::page(locale, slug)),
                InvalidationRequest::path(page_path(locale, slug)),
                InvalidationRequest::tag(cache_tags::PAGES),
            ],
            Self::TeamMemberSaved { .. } | Self::TeamMemberDeleted { .. } => {
                vec![InvalidationRequest::tag(cache_tags::TEAM_MEMBERS)]
            }
            Self::GlobalSaved { slug } => vec![InvalidationRequest::tag(cache_tags::global(slug))],
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::PageSaved { .. } => "page_saved",
            Self::PageDeleted { .. } => "page_deleted",
            Self::TeamMemberSaved { .. } => "team_member_saved",
            Self::TeamMemberDeleted { .. } => "team_member_deleted",
            Self::GlobalSaved { .. } => "global_saved",
        }
    }
}

fn required(value: Option<&str>, field: &str, kind: ChangeKind) -> Result<String, DomainError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(DomainError::validation(format!(
            "{kind:?} change needs --{field}"
        ))),
    }
}

#[derive(Debug, Error)]
pub enum RevalidationError {
    #[error("revalidation secret is not configured")]
    MissingSecret,
    #[error("revalidation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("revalidation endpoint answered {status}: {message}")]
    Rejected { status: StatusCode, message: String },
}

/// HTTP client for the `/api/revalidate` endpoint.
#[derive(Clone, Debug)]
pub struct RevalidationClient {
    client: Client,
    endpoint: Url,
    secret: Option<String>,
}

impl RevalidationClient {
    pub fn new(
        endpoint: Url,
        secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RevalidationError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            secret,
        })
    }

    pub fn from_settings(settings: &RevalidateSettings) -> Result<Self, RevalidationError> {
        Self::new(
            settings.endpoint.clone(),
            settings.secret.clone(),
            settings.timeout,
        )
    }

    pub fn user_agent() -> &'static str {
        concat!("coralpress/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Post one invalidation request.
    pub async fn send(
        &self,
        request: &InvalidationRequest,
    ) -> Result<RevalidateResponse, RevalidationError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or(RevalidationError::MissingSecret)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {secret}"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<RevalidateResponse>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RevalidateResponse>(&text)
            .ok()
            .and_then(|body| body.error)
            .unwrap_or(text);
        Err(RevalidationError::Rejected { status, message })
    }
}

/// Outcome of one hook invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Runs after CMS writes and fans the change out as invalidation requests.
#[derive(Clone, Debug)]
pub struct RevalidationHook {
    client: RevalidationClient,
}

impl RevalidationHook {
    pub fn new(client: RevalidationClient) -> Self {
        Self { client }
    }

    pub async fn after_change(&self, change: &ContentChange) -> HookReport {
        let requests = change.invalidation_requests();
        let mut report = HookReport::default();

        if !self.client.has_secret() {
            warn!(
                target = "coralpress::revalidation",
                change = change.kind(),
                requests = requests.len(),
                "revalidation secret missing; skipping invalidation"
            );
            report.skipped = requests.len();
            return report;
        }

        for request in &requests {
            match self.client.send(request).await {
                Ok(_) => {
                    debug!(
                        target = "coralpress::revalidation",
                        kind = request.kind(),
                        key = request.key(),
                        "invalidation delivered"
                    );
                    report.sent += 1;
                }
                Err(err) => {
                    warn!(
                        target = "coralpress::revalidation",
                        change = change.kind(),
                        kind = request.kind(),
                        key = request.key(),
                        error = %err,
                        "invalidation request failed"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            target = "coralpress::revalidation",
            change = change.kind(),
            sent = report.sent,
            failed = report.failed,
            "content change propagated"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
    use tokio::net::TcpListener;

    use super::*;

    fn page(locale: &str, slug: &str) -> (String, String) {
        (locale.to_string(), slug.to_string())
    }

    #[test]
    fn page_save_targets_tag_and_path() {
        let (locale, slug) = page("en", "about");
        let requests = ContentChange::PageSaved { locale, slug }.invalidation_requests();
        assert_eq!(
            requests,
            vec![
                InvalidationRequest::tag("page:en:about"),
                InvalidationRequest::path("/en/about"),
            ]
        );
    }

    #[test]
    fn page_delete_also_targets_listing_tag() {
        let (locale, slug) = page("de", "home");
        let requests = ContentChange::PageDeleted { locale, slug }.invalidation_requests();
        assert_eq!(requests[1], InvalidationRequest::path("/de"));
        assert_eq!(requests[2], InvalidationRequest::tag("pages"));
    }

    #[test]
    fn collection_changes_target_tags() {
        let member = ContentChange::TeamMemberDeleted { id: "7".into() };
        assert_eq!(
            member.invalidation_requests(),
            vec![InvalidationRequest::tag("team-members")]
        );

        let global = ContentChange::GlobalSaved {
            slug: "footer".into(),
        };
        assert_eq!(
            global.invalidation_requests(),
            vec![InvalidationRequest::tag("global:footer")]
        );
    }

    #[test]
    fn change_kinds_require_their_identifying_fields() {
        let change =
            ContentChange::from_kind(ChangeKind::PageDeleted, Some("en"), Some("about"), None)
                .unwrap();
        assert_eq!(
            change,
            ContentChange::PageDeleted {
                locale: "en".into(),
                slug: "about".into()
            }
        );

        let member =
            ContentChange::from_kind(ChangeKind::TeamMemberSaved, None, None, Some("3")).unwrap();
        assert_eq!(member, ContentChange::TeamMemberSaved { id: "3".into() });

        let err = ContentChange::from_kind(ChangeKind::PageSaved, Some("en"), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("--slug"));
        assert!(ContentChange::from_kind(ChangeKind::GlobalSaved, None, Some(" "), None).is_err());
    }

    type Seen = Arc<Mutex<Vec<(Option<String>, InvalidationRequest)>>>;

    async fn spawn_endpoint(seen: Seen) -> Url {
        async fn handler(
            State(seen): State<Seen>,
            headers: HeaderMap,
            Json(request): Json<InvalidationRequest>,
        ) -> Json<RevalidateResponse> {
            let auth = headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            seen.lock().unwrap().push((auth, request.clone()));
            Json(RevalidateResponse::success(request))
        }

        let app = Router::new()
            .route("/api/revalidate", post(handler))
            .with_state(seen);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/api/revalidate")).unwrap()
    }

    #[tokio::test]
    async fn hook_sends_each_request_with_bearer_secret() {
        let seen: Seen = Arc::default();
        let endpoint = spawn_endpoint(seen.clone()).await;
        let client =
            RevalidationClient::new(endpoint, Some("s3cret".into()), Duration::from_secs(5))
                .unwrap();
        let hook = RevalidationHook::new(client);

        let report = hook
            .after_change(&ContentChange::PageSaved {
                locale: "en".into(),
                slug: "team".into(),
            })
            .await;

        assert_eq!(
            report,
            HookReport {
                sent: 2,
                failed: 0,
                skipped: 0
            }
        );
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(
            seen.iter()
                .all(|(auth, _)| auth.as_deref() == Some("Bearer s3cret"))
        );
        assert_eq!(seen[1].1, InvalidationRequest::path("/en/team"));
    }

    #[tokio::test]
    async fn hook_without_secret_skips_sending() {
        let seen: Seen = Arc::default();
        let endpoint = spawn_endpoint(seen.clone()).await;
        let client = RevalidationClient::new(endpoint, None, Duration::from_secs(5)).unwrap();

        let report = RevalidationHook::new(client)
            .after_change(&ContentChange::TeamMemberSaved { id: "1".into() })
            .await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.sent, 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_counts_failures_without_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Url::parse(&format!("http://{addr}/api/revalidate")).unwrap();
        let client =
            RevalidationClient::new(endpoint, Some("s".into()), Duration::from_secs(2)).unwrap();

        let report = RevalidationHook::new(client)
            .after_change(&ContentChange::GlobalSaved {
                slug: "header".into(),
            })
            .await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 0);
    }
}

//! `POST /api/revalidate`: drop cached pages after a CMS write.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use coralpress_api_types::{RevalidatePayload, RevalidateResponse};
use subtle::ConstantTimeEq;
use tracing::info;

use crate::application::error::ErrorReport;

use super::public::HttpState;

pub const REVALIDATE_PATH: &str = "/api/revalidate";

const SOURCE: &str = "infra::http::revalidate";

pub(super) async fn revalidate(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !authorized(
        state.revalidate_secret.as_deref(),
        headers.get(AUTHORIZATION),
    ) {
        let detail = if state.revalidate_secret.is_none() {
            "revalidation secret is not configured"
        } else {
            "missing or mismatched bearer token"
        };
        return failure(StatusCode::UNAUTHORIZED, "Unauthorized", detail);
    }

    let payload = match serde_json::from_slice::<RevalidatePayload>(&body) {
        Ok(payload) => payload,
        Err(err) => return failure(StatusCode::BAD_REQUEST, "Invalid body", err.to_string()),
    };

    let request = match payload.validate() {
        Ok(request) => request,
        Err(err) => {
            let message = err.to_string();
            return failure(StatusCode::BAD_REQUEST, &message, message.clone());
        }
    };

    let dropped = state.cache.invalidator().invalidate(&request);
    info!(
        target = "coralpress::http::revalidate",
        kind = request.kind(),
        key = request.key(),
        dropped,
        "revalidated"
    );

    (StatusCode::OK, Json(RevalidateResponse::success(request))).into_response()
}

fn extract_token(header: Option<&HeaderValue>) -> Option<&str> {
    header?.to_str().ok()?.strip_prefix("Bearer ")
}

fn authorized(secret: Option<&str>, header: Option<&HeaderValue>) -> bool {
    match (secret, extract_token(header)) {
        (Some(secret), Some(token)) => secret.as_bytes().ct_eq(token.as_bytes()).into(),
        _ => false,
    }
}

fn failure(status: StatusCode, public: &str, detail: impl Into<String>) -> Response {
    let mut response = (status, Json(RevalidateResponse::failure(public))).into_response();
    ErrorReport::from_message(SOURCE, status, detail).attach(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn bearer_token_must_match_exactly() {
        assert!(authorized(Some("abc"), Some(&header("Bearer abc"))));
        assert!(!authorized(Some("abc"), Some(&header("Bearer abcd"))));
        assert!(!authorized(Some("abc"), Some(&header("bearer abc"))));
        assert!(!authorized(Some("abc"), Some(&header("abc"))));
        assert!(!authorized(Some("abc"), None));
    }

    #[test]
    fn no_secret_rejects_everything() {
        assert!(!authorized(None, Some(&header("Bearer "))));
        assert!(!authorized(None, Some(&header("Bearer anything"))));
    }
}

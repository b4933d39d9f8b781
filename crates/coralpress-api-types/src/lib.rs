//! Wire types for the coralpress revalidation protocol.
//!
//! Shared by the server endpoint (`POST /api/revalidate`) and the write-hook
//! client so both sides agree on the JSON shape.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single cache invalidation instruction.
///
/// Serialises as `{"type":"path","path":"/en/about"}` or
/// `{"type":"tag","tag":"team-members"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InvalidationRequest {
    Path { path: String },
    Tag { tag: String },
}

impl InvalidationRequest {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path { path: path.into() }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag { tag: tag.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Path { .. } => "path",
            Self::Tag { .. } => "tag",
        }
    }

    /// The path or tag this request targets.
    pub fn key(&self) -> &str {
        match self {
            Self::Path { path } => path,
            Self::Tag { tag } => tag,
        }
    }
}

/// Loosely-typed request body as received on the wire.
///
/// Every field is optional so the endpoint can tell "unknown type" apart from
/// "missing field" instead of failing the whole parse. Non-string values are
/// read as absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RevalidatePayload {
    #[serde(rename = "type", default, deserialize_with = "string_only")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub tag: Option<String>,
}

fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => Some(value),
        _ => None,
    })
}

impl RevalidatePayload {
    pub fn validate(self) -> Result<InvalidationRequest, PayloadError> {
        match self.kind.as_deref() {
            Some("path") => present(self.path, "path").map(InvalidationRequest::path),
            Some("tag") => present(self.tag, "tag").map(InvalidationRequest::tag),
            _ => Err(PayloadError::UnknownType),
        }
    }
}

fn present(value: Option<String>, field: &'static str) -> Result<String, PayloadError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PayloadError::MissingField(field)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    MissingField(&'static str),
    UnknownType,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "Missing {field}"),
            Self::UnknownType => f.write_str("Unknown type"),
        }
    }
}

impl std::error::Error for PayloadError {}

/// Response body of the revalidation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidateResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revalidated: Option<InvalidationRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RevalidateResponse {
    pub fn success(request: InvalidationRequest) -> Self {
        Self {
            ok: true,
            revalidated: Some(request),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            revalidated: None,
            error: Some(error.into()),
        }
    }
}

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use coralpress_api_types::InvalidationRequest;

/// Identifies one cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: String,
    pub query_hash: u64,
}

impl CacheKey {
    pub fn new(path: &str, query: Option<&str>) -> Self {
        Self {
            path: normalize_path(path),
            query_hash: hash_query(query.unwrap_or_default()),
        }
    }
}

/// Something a cached response was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// Logical content group, e.g. `team-members` or `page:en:about`.
    Tag(String),
    /// Public URL path.
    Path(String),
}

impl Dependency {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    pub fn path(path: &str) -> Self {
        Self::Path(normalize_path(path))
    }
}

impl From<&InvalidationRequest> for Dependency {
    fn from(request: &InvalidationRequest) -> Self {
        match request {
            InvalidationRequest::Path { path } => Dependency::path(path),
            InvalidationRequest::Tag { tag } => Dependency::tag(tag.as_str()),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "tag:{tag}"),
            Self::Path(path) => write!(f, "path:{path}"),
        }
    }
}

pub fn hash_query(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

/// Drop trailing slashes so `/en/about/` and `/en/about` share entries.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

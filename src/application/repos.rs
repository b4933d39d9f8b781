//! Repository traits describing content sources.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::content::{PageDocument, TeamMember};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("malformed content in `{location}`: {message}")]
    Malformed { location: String, message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn malformed(location: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Malformed {
            location: location.into(),
            message: err.to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Read access to published CMS content.
#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Page for `locale`/`slug`, `None` when it does not exist.
    async fn find_page(&self, locale: &str, slug: &str)
    -> Result<Option<PageDocument>, RepoError>;

    /// Every team member, in display order.
    async fn list_team_members(&self) -> Result<Vec<TeamMember>, RepoError>;
}

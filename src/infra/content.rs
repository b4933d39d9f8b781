//! Filesystem-backed content repository.
//!
//! Layout under the content root:
//!
//! ```text
//! pages/{locale}/{slug}.json   one PageDocument per file
//! team-members.json            array of TeamMember
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::application::repos::{ContentRepo, RepoError};
use crate::infra::error::InfraError;
use crate::domain::content::{PageDocument, TeamMember, validate_segment};

const PAGES_DIR: &str = "pages";
const TEAM_MEMBERS_FILE: &str = "team-members.json";

#[derive(Debug, Clone)]
pub struct FsContentRepo {
    root: PathBuf,
}

impl FsContentRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fail fast when the content root is missing, so pages do not all 404.
    pub async fn check_root(&self) -> Result<(), InfraError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(InfraError::content_root(&self.root, None)),
            Err(err) => Err(InfraError::content_root(&self.root, Some(err))),
        }
    }

    fn page_file(&self, locale: &str, slug: &str) -> Result<PathBuf, RepoError> {
        validate_segment("locale", locale).map_err(|err| RepoError::invalid_input(err.to_string()))?;
        validate_segment("slug", slug).map_err(|err| RepoError::invalid_input(err.to_string()))?;
        Ok(self
            .root
            .join(PAGES_DIR)
            .join(locale)
            .join(format!("{slug}.json")))
    }
}

/// Read and parse `path`; `Ok(None)` when the file does not exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RepoError> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(
                target = "coralpress::infra::content",
                path = %path.display(),
                "content file missing"
            );
            return Ok(None);
        }
        Err(err) => return Err(RepoError::from_persistence(err)),
    };

    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|err| RepoError::malformed(path.display().to_string(), err))
}

#[async_trait]
impl ContentRepo for FsContentRepo {
    async fn find_page(
        &self,
        locale: &str,
        slug: &str,
    ) -> Result<Option<PageDocument>, RepoError> {
        let path = self.page_file(locale, slug)?;
        read_json(&path).await
    }

    async fn list_team_members(&self) -> Result<Vec<TeamMember>, RepoError> {
        let path = self.root.join(TEAM_MEMBERS_FILE);
        Ok(read_json(&path).await?.unwrap_or_default())
    }
}

//! Page-builder documents and the collections they pull from.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::DomainError;
use super::richtext::Document;

const MAX_SEGMENT_LEN: usize = 128;

/// Slug used for the landing page of a locale (`/{locale}`).
pub const HOME_SLUG: &str = "home";

/// Cache tags naming the content a rendered page was built from.
pub mod cache_tags {
    /// Every page, for changes that affect page listings.
    pub const PAGES: &str = "pages";
    pub const TEAM_MEMBERS: &str = "team-members";

    pub fn page(locale: &str, slug: &str) -> String {
        format!("page:{locale}:{slug}")
    }

    pub fn global(slug: &str) -> String {
        format!("global:{slug}")
    }
}

/// A localized page as published by the CMS.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PageDocument {
    pub slug: String,
    pub locale: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl PageDocument {
    pub fn has_team_grid(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| matches!(block, Block::TeamGrid(_)))
    }

    /// Public URL path of this page.
    pub fn path(&self) -> String {
        page_path(&self.locale, &self.slug)
    }
}

pub fn page_path(locale: &str, slug: &str) -> String {
    if slug == HOME_SLUG {
        format!("/{locale}")
    } else {
        format!("/{locale}/{slug}")
    }
}

/// One page-builder block. Unrecognised or malformed blocks are kept as
/// [`Block::Unsupported`] so the rest of the page still renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "blockType", rename_all = "camelCase")]
pub enum Block {
    Hero(HeroBlock),
    Content(ContentBlock),
    TeamGrid(TeamGridBlock),
    Testimonials(TestimonialsBlock),
    Timeline(TimelineBlock),
    Unsupported(UnsupportedBlock),
}

#[derive(Deserialize)]
#[serde(tag = "blockType", rename_all = "camelCase")]
enum KnownBlock {
    Hero(HeroBlock),
    Content(ContentBlock),
    TeamGrid(TeamGridBlock),
    Testimonials(TestimonialsBlock),
    Timeline(TimelineBlock),
}

impl From<KnownBlock> for Block {
    fn from(block: KnownBlock) -> Self {
        match block {
            KnownBlock::Hero(b) => Block::Hero(b),
            KnownBlock::Content(b) => Block::Content(b),
            KnownBlock::TeamGrid(b) => Block::TeamGrid(b),
            KnownBlock::Testimonials(b) => Block::Testimonials(b),
            KnownBlock::Timeline(b) => Block::Timeline(b),
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let block_type = value
            .get("blockType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(match serde_json::from_value::<KnownBlock>(value) {
            Ok(block) => block.into(),
            Err(err) => Block::Unsupported(UnsupportedBlock {
                block_type,
                reason: err.to_string(),
            }),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroBlock {
    pub heading: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Document>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    #[serde(default)]
    pub rich_text: Document,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TeamGridBlock {
    #[serde(default)]
    pub heading: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TestimonialsBlock {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub items: Vec<Testimonial>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Testimonial {
    pub quote: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TimelineBlock {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub entries: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub date: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Document>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UnsupportedBlock {
    pub block_type: String,
    pub reason: String,
}

/// Entry of the shared team-members collection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<Document>,
}

/// Check a locale or slug before it is used to address content.
pub fn validate_segment(kind: &'static str, value: &str) -> Result<(), DomainError> {
    if value.is_empty() || value.len() > MAX_SEGMENT_LEN {
        return Err(DomainError::validation(format!(
            "{kind} must be between 1 and {MAX_SEGMENT_LEN} characters"
        )));
    }
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !allowed || value.starts_with('-') {
        return Err(DomainError::validation(format!(
            "{kind} `{value}` contains unsupported characters"
        )));
    }
    Ok(())
}

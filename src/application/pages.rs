use std::sync::Arc;

use askama::Template;
use axum::http::StatusCode;
use thiserror::Error;
use tracing::warn;

use crate::application::error::HttpError;
use crate::application::repos::{ContentRepo, RepoError};
use crate::application::richtext::{RenderError, RichTextRenderer, SlugPathResolver};
use crate::cache::{Dependency, deps};
use crate::domain::content::{
    Block, PageDocument, TeamMember, TestimonialsBlock, TimelineBlock, cache_tags,
    validate_segment,
};
use crate::domain::richtext::Document;
use crate::presentation::views::{
    ContentBlockTemplate, HeroBlockTemplate, PageView, TeamGridBlockTemplate, TeamMemberView,
    TestimonialView, TestimonialsBlockTemplate, TimelineBlockTemplate, TimelineEntryView,
    UnsupportedBlockTemplate, block_error_marker,
};

const SOURCE: &str = "application::pages::PageService";

#[derive(Debug, Error)]
enum BlockError {
    #[error(transparent)]
    RichText(#[from] RenderError),
    #[error(transparent)]
    Template(#[from] askama::Error),
}

/// Loads localized pages and renders their page-builder blocks.
#[derive(Clone)]
pub struct PageService {
    content: Arc<dyn ContentRepo>,
    richtext: RichTextRenderer,
}

impl PageService {
    pub fn new(content: Arc<dyn ContentRepo>, richtext: RichTextRenderer) -> Self {
        Self { content, richtext }
    }

    /// Render the page at `locale`/`slug`. `None` means not found, including
    /// addresses that can never name a page.
    pub async fn render_page(
        &self,
        locale: &str,
        slug: &str,
    ) -> Result<Option<PageView>, HttpError> {
        if validate_segment("locale", locale).is_err() || validate_segment("slug", slug).is_err()
        {
            return Ok(None);
        }

        // Record dependencies for cache invalidation
        deps::record(Dependency::Tag(cache_tags::page(locale, slug)));
        deps::record(Dependency::Tag(cache_tags::PAGES.to_string()));

        let page = self
            .content
            .find_page(locale, slug)
            .await
            .map_err(|err| repo_failure("find_page", err))?;

        let Some(page) = page else {
            return Ok(None);
        };

        let members = if page.has_team_grid() {
            deps::record(Dependency::Tag(cache_tags::TEAM_MEMBERS.to_string()));
            self.content
                .list_team_members()
                .await
                .map_err(|err| repo_failure("list_team_members", err))?
        } else {
            Vec::new()
        };

        Ok(Some(self.build_view(page, &members)))
    }

    fn build_view(&self, page: PageDocument, members: &[TeamMember]) -> PageView {
        let resolver = SlugPathResolver::new(&page.locale);
        let blocks = page
            .blocks
            .iter()
            .map(|block| {
                self.render_block(block, &resolver, members)
                    .unwrap_or_else(|err| {
                        warn!(
                            target = "coralpress::pages",
                            locale = %page.locale,
                            slug = %page.slug,
                            block = block_kind(block),
                            error = %err,
                            "block failed to render"
                        );
                        block_error_marker(block_kind(block))
                    })
            })
            .collect();

        PageView {
            locale: page.locale,
            title: page.title,
            description: page.description.unwrap_or_default(),
            blocks,
        }
    }

    fn render_block(
        &self,
        block: &Block,
        resolver: &SlugPathResolver,
        members: &[TeamMember],
    ) -> Result<String, BlockError> {
        let rich = |document: Option<&Document>| -> Result<String, RenderError> {
            match document {
                Some(document) => Ok(self
                    .richtext
                    .render_with(document, resolver)?
                    .unwrap_or_default()),
                None => Ok(String::new()),
            }
        };

        let html = match block {
            Block::Hero(hero) => HeroBlockTemplate {
                heading: &hero.heading,
                subheading: hero.subheading.as_deref().unwrap_or_default(),
                body_html: rich(hero.rich_text.as_ref())?,
            }
            .render()?,
            Block::Content(content) => ContentBlockTemplate {
                body_html: rich(Some(&content.rich_text))?,
            }
            .render()?,
            Block::TeamGrid(grid) => {
                let members = members
                    .iter()
                    .map(|member| -> Result<_, RenderError> {
                        Ok(TeamMemberView {
                            name: member.name.clone(),
                            role: member.role.clone().unwrap_or_default(),
                            bio_html: rich(member.bio.as_ref())?,
                        })
                    })
                    .collect::<Result<Vec<_>, RenderError>>()?;
                TeamGridBlockTemplate {
                    heading: &grid.heading,
                    members,
                }
                .render()?
            }
            Block::Testimonials(testimonials) => render_testimonials(testimonials)?,
            Block::Timeline(timeline) => {
                let entries = timeline
                    .entries
                    .iter()
                    .map(|entry| -> Result<_, RenderError> {
                        Ok(TimelineEntryView {
                            date: entry.date.clone(),
                            title: entry.title.clone(),
                            body_html: rich(entry.rich_text.as_ref())?,
                        })
                    })
                    .collect::<Result<Vec<_>, RenderError>>()?;
                render_timeline(timeline, entries)?
            }
            Block::Unsupported(unsupported) => {
                warn!(
                    target = "coralpress::pages",
                    block_type = %unsupported.block_type,
                    reason = %unsupported.reason,
                    "unsupported page block"
                );
                UnsupportedBlockTemplate {
                    block_type: &unsupported.block_type,
                }
                .render()?
            }
        };
        Ok(html)
    }
}

fn render_testimonials(block: &TestimonialsBlock) -> Result<String, askama::Error> {
    TestimonialsBlockTemplate {
        heading: &block.heading,
        items: block
            .items
            .iter()
            .map(|item| TestimonialView {
                quote: item.quote.clone(),
                author: item.author.clone(),
                role: item.role.clone().unwrap_or_default(),
            })
            .collect(),
    }
    .render()
}

fn render_timeline(
    block: &TimelineBlock,
    entries: Vec<TimelineEntryView>,
) -> Result<String, askama::Error> {
    TimelineBlockTemplate {
        heading: &block.heading,
        entries,
    }
    .render()
}

fn block_kind(block: &Block) -> &'static str {
    match block {
        Block::Hero(_) => "hero",
        Block::Content(_) => "content",
        Block::TeamGrid(_) => "teamGrid",
        Block::Testimonials(_) => "testimonials",
        Block::Timeline(_) => "timeline",
        Block::Unsupported(_) => "unsupported",
    }
}

fn repo_failure(operation: &'static str, err: RepoError) -> HttpError {
    HttpError::from_error(
        SOURCE,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to load page content",
        &RepoFailure { operation, err },
    )
}

#[derive(Debug, Error)]
#[error("{operation} failed")]
struct RepoFailure {
    operation: &'static str,
    #[source]
    err: RepoError,
}

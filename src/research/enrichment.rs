//! Best-effort enrichment of top Reddit posts with full thread data.
//!
//! Threads are fetched in sequential batches with bounded concurrency inside
//! each batch, which caps outstanding connections to the upstream. A failed
//! fetch leaves the post exactly as it was.

use crate::types::{excerpt, EnrichmentUpdate, Post, Result, MAX_COMMENT_INSIGHTS};
use async_trait::async_trait;
use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Minimum length of a comment worth quoting.
pub const MIN_INSIGHT_CHARS: usize = 30;

/// Maximum length of a quoted comment.
pub const INSIGHT_EXCERPT_CHARS: usize = 300;

/// Whole comments that carry no information on their own.
pub const LOW_SIGNAL_COMMENTS: &[&str] = &[
    "lol",
    "lmao",
    "agreed",
    "this",
    "same",
    "+1",
    "thanks",
    "thank you",
    "came here to say this",
    "underrated comment",
];

/// A single comment from a thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadComment {
    pub author: String,
    pub body: String,
    pub score: i64,
}

/// Authoritative thread data for one post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadDetail {
    pub score: i64,
    pub num_comments: i64,
    pub upvote_ratio: Option<f64>,
    pub selftext: String,
    pub comments: Vec<ThreadComment>,
}

/// Upstream that can return the canonical thread for a post.
#[async_trait]
pub trait ThreadSource: Send + Sync {
    async fn fetch_thread(&self, post: &Post) -> Result<ThreadDetail>;
}

/// Pick up to five quotable comments, highest score first.
pub fn select_insights(comments: &[ThreadComment]) -> Vec<String> {
    let mut candidates: Vec<&ThreadComment> = comments
        .iter()
        .filter(|c| !is_deleted(&c.author) && !is_deleted(&c.body))
        .filter(|c| c.body.trim().chars().count() >= MIN_INSIGHT_CHARS)
        .filter(|c| !is_low_signal(&c.body))
        .collect();

    // stable: equal scores keep thread order
    candidates.sort_by(|a, b| b.score.cmp(&a.score));

    candidates
        .into_iter()
        .filter_map(|c| excerpt(&c.body.replace('\n', " "), INSIGHT_EXCERPT_CHARS))
        .take(MAX_COMMENT_INSIGHTS)
        .collect()
}

fn is_deleted(text: &str) -> bool {
    matches!(text.trim(), "" | "[deleted]" | "[removed]")
}

/// True when the whole comment is a low-signal phrase.
///
/// Case, punctuation and emoji are ignored, so `"Agreed!! 👍"` matches while
/// `"This is exactly why we moved off HubSpot"` does not.
pub fn is_low_signal(body: &str) -> bool {
    let normalized: String = body
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '+' { c } else { ' ' })
        .collect();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    LOW_SIGNAL_COMMENTS.contains(&normalized.as_str())
}

/// Build the enriched copy of `post` from its thread.
pub fn apply_thread(post: &Post, detail: &ThreadDetail) -> Post {
    post.enriched(&EnrichmentUpdate {
        engagement_score: detail.score,
        comment_count: detail.num_comments,
        engagement_ratio: detail.upvote_ratio,
        body: Some(detail.selftext.clone()),
        comment_insights: select_insights(&detail.comments),
    })
}

/// Enrichment worker.
pub struct Enricher<'a> {
    source: &'a dyn ThreadSource,
    batch_size: usize,
}

/// Posts after enrichment, in input order.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    pub posts: Vec<Post>,
    pub enriched: usize,
    /// The deadline fired before every batch ran
    pub interrupted: bool,
}

impl<'a> Enricher<'a> {
    pub fn new(source: &'a dyn ThreadSource, batch_size: usize) -> Self {
        Self {
            source,
            batch_size: batch_size.max(1),
        }
    }

    async fn enrich_one(&self, post: Post) -> (Post, bool) {
        match self.source.fetch_thread(&post).await {
            Ok(detail) => (apply_thread(&post, &detail), true),
            Err(e) => {
                debug!(url = %post.url, error = %e, "enrichment failed, keeping original post");
                (post, false)
            }
        }
    }

    /// Enrich `posts` batch by batch, stopping at `deadline`.
    ///
    /// Posts in batches that did not finish before the deadline are returned
    /// unchanged.
    pub async fn enrich(&self, posts: Vec<Post>, deadline: Option<Instant>) -> EnrichmentOutcome {
        let mut outcome = EnrichmentOutcome {
            posts: Vec::with_capacity(posts.len()),
            ..Default::default()
        };
        let mut remaining = posts.into_iter();

        loop {
            let batch: Vec<Post> = remaining.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }

            let fallback = batch.clone();
            let work = join_all(batch.into_iter().map(|post| self.enrich_one(post)));
            let results = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, work).await.ok(),
                None => Some(work.await),
            };

            match results {
                Some(results) => {
                    for (post, enriched) in results {
                        outcome.enriched += usize::from(enriched);
                        outcome.posts.push(post);
                    }
                }
                None => {
                    warn!("enrichment interrupted by deadline");
                    outcome.interrupted = true;
                    outcome.posts.extend(fallback);
                    outcome.posts.extend(remaining);
                    break;
                }
            }
        }

        info!(
            candidates = outcome.posts.len(),
            enriched = outcome.enriched,
            "enrichment finished"
        );
        outcome
    }
}

//! Deduplication and engagement/recency ranking.
//!
//! Duplicate resolution is first-seen-wins by normalized URL. The pipeline
//! relies on that: enriched posts must reach the deduplicator before their
//! raw counterparts, which is why [`merge_and_rank`] takes the two groups as
//! separate, ordered parameters instead of a pre-concatenated list.

use crate::types::Post;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// One step of the recency boost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyTier {
    /// Inclusive upper bound on post age, in whole days
    pub max_age_days: i64,
    pub multiplier: f64,
}

/// Search window and ranking boosts shared by every connector and the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecencyPolicy {
    /// Connectors drop content older than this many days
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    /// Boost tiers, checked in ascending age order
    #[serde(default = "default_tiers")]
    pub tiers: Vec<RecencyTier>,

    /// Multiplier for content older than every tier
    #[serde(default = "default_multiplier")]
    pub default_multiplier: f64,
}

fn default_window_days() -> i64 {
    30
}

fn default_tiers() -> Vec<RecencyTier> {
    vec![
        RecencyTier {
            max_age_days: 7,
            multiplier: 1.5,
        },
        RecencyTier {
            max_age_days: 14,
            multiplier: 1.2,
        },
    ]
}

fn default_multiplier() -> f64 {
    1.0
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            tiers: default_tiers(),
            default_multiplier: default_multiplier(),
        }
    }
}

impl RecencyPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.window_days <= 0 {
            return Err("recency.window_days must be greater than zero".to_string());
        }
        if self.default_multiplier <= 0.0 || self.tiers.iter().any(|t| t.multiplier <= 0.0) {
            return Err("recency multipliers must be positive".to_string());
        }
        if self.tiers.iter().any(|t| t.max_age_days < 0) {
            return Err("recency tier ages must not be negative".to_string());
        }
        Ok(())
    }

    /// Oldest creation time still inside the search window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.window_days)
    }

    pub fn within_window(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        created_at >= self.cutoff(now)
    }

    /// Step function of age in whole days. Future timestamps count as age 0.
    pub fn multiplier(&self, age_days: i64) -> f64 {
        let age = age_days.max(0);
        let mut tiers: Vec<&RecencyTier> = self.tiers.iter().collect();
        tiers.sort_by_key(|t| t.max_age_days);
        tiers
            .into_iter()
            .find(|t| age <= t.max_age_days)
            .map(|t| t.multiplier)
            .unwrap_or(self.default_multiplier)
    }

    pub fn multiplier_at(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        self.multiplier((now - created_at).num_days())
    }
}

/// Canonical identity key: trimmed, trailing slashes stripped, lowercased.
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

/// Keep the first post seen for each normalized URL, preserving input order.
pub fn dedupe(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|post| seen.insert(normalize_url(&post.url)))
        .collect()
}

/// `(engagement + comments * 2) * recency multiplier`
pub fn score(post: &Post, policy: &RecencyPolicy, now: DateTime<Utc>) -> f64 {
    let base = post.engagement_score as f64 + post.comment_count as f64 * 2.0;
    base * policy.multiplier_at(post.created_at, now)
}

/// Deduplicate, then sort by descending score against the current time.
pub fn rank(posts: Vec<Post>, policy: &RecencyPolicy) -> Vec<Post> {
    rank_at(posts, policy, Utc::now())
}

/// Deduplicate, then stable-sort by descending score as of `now`.
pub fn rank_at(posts: Vec<Post>, policy: &RecencyPolicy, now: DateTime<Utc>) -> Vec<Post> {
    let mut scored: Vec<(f64, Post)> = dedupe(posts)
        .into_iter()
        .map(|post| (score(&post, policy, now), post))
        .collect();

    // Vec::sort_by is stable, so equal scores keep input order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, post)| post).collect()
}

/// Merge enriched posts ahead of raw ones, then rank.
///
/// A URL present in both groups resolves to the enriched copy.
pub fn merge_and_rank(
    enriched: Vec<Post>,
    raw: Vec<Post>,
    policy: &RecencyPolicy,
    now: DateTime<Utc>,
) -> Vec<Post> {
    let mut combined = enriched;
    combined.extend(raw);
    rank_at(combined, policy, now)
}

//! Reddit search via the public JSON listing endpoints.

use crate::research::enrichment::{ThreadComment, ThreadDetail, ThreadSource};
use crate::research::ranking::RecencyPolicy;
use crate::sources::{ensure_success, http_client, Connector, SearchRequest, SearchScope};
use crate::types::{AppError, Post, Result, SourceKind};
use crate::utils::toml_config::RedditConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Canonical host used for post URLs regardless of the configured API base.
pub const REDDIT_SITE: &str = "https://www.reddit.com";

/// Phase-2 drill-down never searches more communities than this.
pub const MAX_COMMUNITY_SEARCHES: usize = 5;

const THREAD_COMMENT_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    #[serde(default)]
    kind: String,
    data: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RedditPost {
    title: String,
    permalink: String,
    subreddit: String,
    score: i64,
    num_comments: i64,
    created_utc: f64,
    selftext: String,
    upvote_ratio: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RedditComment {
    author: String,
    body: String,
    score: i64,
}

/// Reddit search connector and thread source.
pub struct RedditConnector {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    limit: u32,
    policy: RecencyPolicy,
}

impl RedditConnector {
    pub fn new(config: &RedditConfig, policy: RecencyPolicy) -> Self {
        Self {
            http: http_client(&config.user_agent),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            limit: config.limit,
            policy,
        }
    }

    /// Reddit's coarse `t=` filter covering the recency window.
    fn time_filter(&self) -> &'static str {
        match self.policy.window_days {
            d if d <= 1 => "day",
            d if d <= 7 => "week",
            d if d <= 31 => "month",
            d if d <= 365 => "year",
            _ => "all",
        }
    }

    fn search_urls(&self, request: &SearchRequest) -> Vec<(String, String)> {
        match &request.scope {
            SearchScope::Broad => request
                .queries
                .iter()
                .map(|q| (format!("{}/search.json", self.base_url), q.clone()))
                .collect(),
            SearchScope::Communities(communities) => communities
                .iter()
                .take(MAX_COMMUNITY_SEARCHES)
                .map(|c| {
                    (
                        format!("{}/r/{}/search.json", self.base_url, c),
                        request.topic.clone(),
                    )
                })
                .collect(),
            SearchScope::Handles(_) => Vec::new(),
        }
    }

    async fn search_one(&self, url: &str, query: &str, restrict: bool) -> Result<Vec<Post>> {
        let limit = self.limit.to_string();
        let mut params = vec![
            ("q", query),
            ("sort", "top"),
            ("t", self.time_filter()),
            ("limit", limit.as_str()),
            ("raw_json", "1"),
        ];
        if restrict {
            params.push(("restrict_sr", "on"));
        }

        let response = self
            .http
            .get(url)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;
        let listing: Listing = ensure_success(response).await?.json().await?;

        let now = Utc::now();
        Ok(listing
            .data
            .children
            .into_iter()
            .filter(|thing| thing.kind == "t3")
            .filter_map(|thing| serde_json::from_value::<RedditPost>(thing.data).ok())
            .filter_map(to_post)
            .filter(|post| self.policy.within_window(post.created_at, now))
            .collect())
    }
}

fn to_post(raw: RedditPost) -> Option<Post> {
    if raw.title.trim().is_empty() || raw.permalink.is_empty() {
        return None;
    }
    let created_at = DateTime::from_timestamp(raw.created_utc as i64, 0)?;
    let mut post = Post::new(
        SourceKind::Reddit,
        raw.title.trim(),
        format!("{}{}", REDDIT_SITE, raw.permalink),
        created_at,
    )
    .with_community(raw.subreddit)
    .with_engagement(raw.score, raw.num_comments)
    .with_body(&raw.selftext);
    if let Some(ratio) = raw.upvote_ratio {
        post = post.with_engagement_ratio(ratio);
    }
    Some(post)
}

#[async_trait]
impl Connector for RedditConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Reddit
    }

    fn budget(&self) -> Duration {
        // requests run concurrently, each under `timeout`
        self.timeout + Duration::from_secs(2)
    }

    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<Post>> {
        let restrict = matches!(request.scope, SearchScope::Communities(_));
        let targets = self.search_urls(request);
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let results = join_all(
            targets
                .iter()
                .map(|(url, query)| self.search_one(url, query, restrict)),
        )
        .await;

        let mut posts = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0;
        for ((url, _), result) in targets.iter().zip(results) {
            match result {
                Ok(batch) => {
                    succeeded += 1;
                    posts.extend(batch);
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "reddit search request failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(posts),
        }
    }
}

#[async_trait]
impl ThreadSource for RedditConnector {
    async fn fetch_thread(&self, post: &Post) -> Result<ThreadDetail> {
        let parsed = url::Url::parse(&post.url)
            .map_err(|e| AppError::InvalidInput(format!("bad thread url {}: {}", post.url, e)))?;
        let path = parsed.path().trim_end_matches('/');
        if !path.contains("/comments/") {
            return Err(AppError::InvalidInput(format!(
                "not a thread url: {}",
                post.url
            )));
        }

        let response = self
            .http
            .get(format!("{}{}.json", self.base_url, path))
            .query(&[
                ("limit", THREAD_COMMENT_LIMIT.to_string()),
                ("sort", "top".to_string()),
                ("raw_json", "1".to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        let listings: Vec<Listing> = ensure_success(response).await?.json().await?;

        let mut listings = listings.into_iter();
        let submission = listings
            .next()
            .and_then(|l| l.data.children.into_iter().next())
            .ok_or_else(|| AppError::Parse("thread response missing submission".to_string()))?;
        let submission: RedditPost = serde_json::from_value(submission.data)?;

        let comments = listings
            .next()
            .map(|l| l.data.children)
            .unwrap_or_default()
            .into_iter()
            .filter(|thing| thing.kind == "t1")
            .filter_map(|thing| serde_json::from_value::<RedditComment>(thing.data).ok())
            .map(|c| ThreadComment {
                author: c.author,
                body: c.body,
                score: c.score,
            })
            .collect();

        Ok(ThreadDetail {
            score: submission.score,
            num_comments: submission.num_comments,
            upvote_ratio: submission.upvote_ratio,
            selftext: submission.selftext,
            comments,
        })
    }
}

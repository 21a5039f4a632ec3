//! Hacker News story search through the Algolia index.

use crate::research::ranking::RecencyPolicy;
use crate::sources::{ensure_success, http_client, Connector, SearchRequest, SearchScope};
use crate::types::{Post, Result, SourceKind};
use crate::utils::toml_config::HackerNewsConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

const ITEM_URL: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    url: Option<String>,
    points: Option<i64>,
    num_comments: Option<i64>,
    created_at_i: i64,
    story_text: Option<String>,
}

pub struct HackerNewsConnector {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    hits_per_page: u32,
    policy: RecencyPolicy,
}

impl HackerNewsConnector {
    pub fn new(config: &HackerNewsConfig, policy: RecencyPolicy) -> Self {
        Self {
            http: http_client(concat!("trendscout/", env!("CARGO_PKG_VERSION"))),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            hits_per_page: config.hits_per_page,
            policy,
        }
    }
}

fn to_post(hit: Hit) -> Option<Post> {
    let title = hit.title.filter(|t| !t.trim().is_empty())?;
    let created_at = DateTime::from_timestamp(hit.created_at_i, 0)?;
    // Ask HN and similar posts have no outbound link
    let url = hit
        .url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| format!("{}{}", ITEM_URL, hit.object_id));

    let post = Post::new(SourceKind::HackerNews, title.trim(), url, created_at)
        .with_engagement(hit.points.unwrap_or(0), hit.num_comments.unwrap_or(0));
    Some(match hit.story_text {
        Some(text) => post.with_body(&text),
        None => post,
    })
}

#[async_trait]
impl Connector for HackerNewsConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::HackerNews
    }

    fn budget(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<Post>> {
        if !matches!(request.scope, SearchScope::Broad) {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let cutoff = self.policy.cutoff(now).timestamp();
        let response = self
            .http
            .get(format!("{}/api/v1/search", self.base_url))
            .query(&[
                ("query", request.topic.clone()),
                ("tags", "story".to_string()),
                ("numericFilters", format!("created_at_i>{}", cutoff)),
                ("hitsPerPage", self.hits_per_page.to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        let body: SearchResponse = ensure_success(response).await?.json().await?;

        Ok(body
            .hits
            .into_iter()
            .filter_map(to_post)
            .filter(|post| self.policy.within_window(post.created_at, now))
            .collect())
    }
}

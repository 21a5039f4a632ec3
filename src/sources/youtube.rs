//! YouTube Data API v3 video search.
//!
//! Without an API key this connector returns nothing and makes no requests.
//! Statistics come from a second, best-effort `videos` call: if it fails the
//! search results are still returned with zero engagement.

use crate::research::ranking::RecencyPolicy;
use crate::sources::{ensure_success, http_client, Connector, SearchRequest, SearchScope};
use crate::types::{Post, Result, SourceKind};
use crate::utils::toml_config::{YouTubeConfig, MAX_YOUTUBE_RESULTS};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoStats>,
}

#[derive(Debug, Deserialize)]
struct VideoStats {
    id: String,
    #[serde(default)]
    statistics: Statistics,
}

// The API encodes counts as strings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Statistics {
    like_count: Option<String>,
    comment_count: Option<String>,
}

fn count(value: &Option<String>) -> i64 {
    value
        .as_deref()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

pub struct YouTubeConnector {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    max_results: u32,
    policy: RecencyPolicy,
}

impl YouTubeConnector {
    pub fn new(config: &YouTubeConfig, api_key: Option<String>, policy: RecencyPolicy) -> Self {
        Self {
            http: http_client(concat!("trendscout/", env!("CARGO_PKG_VERSION"))),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
            max_results: config.max_results.clamp(1, MAX_YOUTUBE_RESULTS),
            policy,
        }
    }

    async fn statistics(&self, api_key: &str, ids: &[String]) -> Result<HashMap<String, Statistics>> {
        let ids = ids.join(",");
        let response = self
            .http
            .get(format!("{}/youtube/v3/videos", self.base_url))
            .query(&[
                ("part", "statistics"),
                ("id", ids.as_str()),
                ("key", api_key),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        let body: VideosResponse = ensure_success(response).await?.json().await?;
        Ok(body
            .items
            .into_iter()
            .map(|item| (item.id, item.statistics))
            .collect())
    }
}

#[async_trait]
impl Connector for YouTubeConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::YouTube
    }

    fn budget(&self) -> Duration {
        // search + statistics
        self.timeout * 2
    }

    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<Post>> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("no YouTube API key configured, skipping");
            return Ok(Vec::new());
        };
        if !matches!(request.scope, SearchScope::Broad) {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let published_after = self
            .policy
            .cutoff(now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results = self.max_results.to_string();
        let response = self
            .http
            .get(format!("{}/youtube/v3/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("order", "viewCount"),
                ("q", request.topic.as_str()),
                ("publishedAfter", published_after.as_str()),
                ("maxResults", max_results.as_str()),
                ("key", api_key),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        let body: SearchResponse = ensure_success(response).await?.json().await?;

        let videos: Vec<(String, Snippet)> = body
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id.map(|id| (id, item.snippet)))
            .filter(|(_, snippet)| self.policy.within_window(snippet.published_at, now))
            .collect();
        if videos.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = videos.iter().map(|(id, _)| id.clone()).collect();
        let stats = match self.statistics(api_key, &ids).await {
            Ok(stats) => stats,
            Err(e) => {
                debug!(error = %e, "YouTube statistics lookup failed, using zero engagement");
                HashMap::new()
            }
        };

        Ok(videos
            .into_iter()
            .map(|(id, snippet)| {
                let (likes, comments) = stats
                    .get(&id)
                    .map(|s| (count(&s.like_count), count(&s.comment_count)))
                    .unwrap_or((0, 0));
                Post::new(
                    SourceKind::YouTube,
                    snippet.title.trim(),
                    format!("{}{}", WATCH_URL, id),
                    snippet.published_at,
                )
                .with_community(snippet.channel_title)
                .with_engagement(likes, comments)
                .with_body(&snippet.description)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryType;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn connector(base: &str, key: Option<&str>) -> YouTubeConnector {
        let config = YouTubeConfig {
            base_url: base.to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        YouTubeConnector::new(&config, key.map(String::from), RecencyPolicy::default())
    }

    fn request() -> SearchRequest {
        SearchRequest::new("home espresso", QueryType::General, vec![])
    }

    #[tokio::test]
    async fn test_no_key_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let posts = connector(&server.uri(), None).fetch(&request()).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_search_with_statistics() {
        let server = MockServer::start().await;
        let published = (Utc::now() - chrono::Duration::days(3)).to_rfc3339();
        Mock::given(method("GET"))
            .and(path("/youtube/v3/search"))
            .and(query_param("key", "yt-key"))
            .and(query_param("order", "viewCount"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": {"videoId": "abc123"}, "snippet": {
                        "title": "Espresso at home", "description": "Dialing in",
                        "channelTitle": "Coffee Lab", "publishedAt": published}},
                    {"id": {"channelId": "chan"}, "snippet": {
                        "title": "A channel", "publishedAt": published}}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("id", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "abc123", "statistics": {"viewCount": "90000", "likeCount": "1200", "commentCount": "85"}}]
            })))
            .mount(&server)
            .await;

        let posts = connector(&server.uri(), Some("yt-key"))
            .fetch(&request())
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(posts[0].community.as_deref(), Some("Coffee Lab"));
        assert_eq!(posts[0].engagement_score, 1200);
        assert_eq!(posts[0].comment_count, 85);
    }

    #[tokio::test]
    async fn test_statistics_failure_keeps_results() {
        let server = MockServer::start().await;
        let published = Utc::now().to_rfc3339();
        Mock::given(method("GET"))
            .and(path("/youtube/v3/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": {"videoId": "v1"}, "snippet": {"title": "Video", "publishedAt": published}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let posts = connector(&server.uri(), Some("k"))
            .fetch(&request())
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].engagement_score, 0);
    }

    #[tokio::test]
    async fn test_max_results_capped_at_ten() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/search"))
            .and(query_param("maxResults", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let config = YouTubeConfig {
            base_url: server.uri(),
            timeout_secs: 2,
            max_results: 50,
            ..Default::default()
        };
        let posts = YouTubeConnector::new(&config, Some("k".into()), RecencyPolicy::default())
            .fetch(&request())
            .await
            .unwrap();

        assert!(posts.is_empty());
    }
}

//! X search through xAI's server-side `x_search` tool.
//!
//! The model answers in prose; [`parse_social_posts`] turns the text and its
//! citations into posts. This is the slowest call in the pipeline, so the
//! configured timeout is applied to the request itself and to the connector
//! budget.

use crate::research::ranking::RecencyPolicy;
use crate::sources::social_parse::parse_social_posts;
use crate::sources::{http_client, responses_search, Connector, SearchRequest, SearchScope};
use crate::types::{Post, Result, SourceKind};
use crate::utils::toml_config::XConfig;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// The search tool accepts at most this many handles.
pub const MAX_ALLOWED_HANDLES: usize = 10;

const MAX_POSTS: usize = 15;

pub struct XConnector {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    policy: RecencyPolicy,
}

impl XConnector {
    pub fn new(config: &XConfig, api_key: Option<String>, policy: RecencyPolicy) -> Self {
        Self {
            http: http_client(concat!("trendscout/", env!("CARGO_PKG_VERSION"))),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            policy,
        }
    }

    fn prompt(&self, topic: &str, handles: &[String]) -> String {
        let scope = if handles.is_empty() {
            String::new()
        } else {
            format!(
                " Only include posts written by these accounts: {}.",
                handles
                    .iter()
                    .map(|h| format!("@{}", h))
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        format!(
            "Find the {max} most-engaged X posts from the last {days} days about \"{topic}\".{scope}\n\
             Answer with a numbered list, one post per item. For each post give: the author's \
             @handle, the date as YYYY-MM-DD, the post text in double quotes, the like count, \
             the reply count, and the full status link.",
            max = MAX_POSTS,
            days = self.policy.window_days,
            topic = topic,
            scope = scope,
        )
    }
}

#[async_trait]
impl Connector for XConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::X
    }

    fn budget(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<Post>> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("no xAI API key configured, skipping X search");
            return Ok(Vec::new());
        };
        let handles: Vec<String> = match &request.scope {
            SearchScope::Broad => Vec::new(),
            SearchScope::Handles(handles) if !handles.is_empty() => {
                handles.iter().take(MAX_ALLOWED_HANDLES).cloned().collect()
            }
            _ => return Ok(Vec::new()),
        };

        let now = Utc::now();
        let mut tool = json!({
            "type": "x_search",
            "from_date": self.policy.cutoff(now).format("%Y-%m-%d").to_string(),
            "to_date": now.format("%Y-%m-%d").to_string(),
        });
        if !handles.is_empty() {
            tool["allowed_x_handles"] = json!(handles);
        }
        let body = json!({
            "model": self.model,
            "input": [{"role": "user", "content": self.prompt(&request.topic, &handles)}],
            "tools": [tool],
        });

        let output = responses_search(&self.http, &self.base_url, api_key, &body, self.timeout).await?;
        let citations: Vec<String> = output.citations.into_iter().map(|c| c.url).collect();

        Ok(parse_social_posts(&output.text, &citations, now)
            .into_iter()
            .filter(|post| self.policy.within_window(post.created_at, now))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryType;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn connector(base: &str, key: Option<&str>) -> XConnector {
        let config = XConfig {
            base_url: base.to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        XConnector::new(&config, key.map(String::from), RecencyPolicy::default())
    }

    fn response(text: &str, citations: &[&str]) -> serde_json::Value {
        json!({
            "output": [{"type": "message", "content": [{"type": "output_text", "text": text, "annotations": []}]}],
            "citations": citations,
        })
    }

    #[tokio::test]
    async fn test_broad_search_parses_posts() {
        let server = MockServer::start().await;
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let text = format!(
            "1. @buildinpublic ({}): \"We replaced our CRM with a spreadsheet\" 2.3K likes, 140 replies https://x.com/buildinpublic/status/42",
            today
        );
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("authorization", "Bearer xai-key"))
            .and(body_partial_json(json!({"tools": [{"type": "x_search"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(response(
                &text,
                &["https://x.com/buildinpublic/status/42", "https://x.com/other/status/7"],
            )))
            .mount(&server)
            .await;

        let request = SearchRequest::new("crm", QueryType::General, vec![]);
        let posts = connector(&server.uri(), Some("xai-key"))
            .fetch(&request)
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].engagement_score, 2300);
        assert_eq!(posts[0].comment_count, 140);
        assert_eq!(posts[0].community.as_deref(), Some("@buildinpublic"));
        assert_eq!(posts[1].url, "https://x.com/other/status/7");
    }

    #[tokio::test]
    async fn test_handle_scope_sends_allow_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"tools": [{"allowed_x_handles": ["alice", "bob"]}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(response("", &[])))
            .expect(1)
            .mount(&server)
            .await;

        let request = SearchRequest::new("crm", QueryType::General, vec![])
            .with_scope(SearchScope::Handles(vec!["alice".into(), "bob".into()]));
        let posts = connector(&server.uri(), Some("k")).fetch(&request).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_empty_handle_scope_and_missing_key_are_noops() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let scoped = SearchRequest::new("crm", QueryType::General, vec![])
            .with_scope(SearchScope::Handles(vec![]));
        assert!(connector(&server.uri(), Some("k"))
            .fetch(&scoped)
            .await
            .unwrap()
            .is_empty());

        let broad = SearchRequest::new("crm", QueryType::General, vec![]);
        assert!(connector(&server.uri(), None)
            .fetch(&broad)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_prompt_names_handles() {
        let prompt = connector("http://localhost", None).prompt("crm", &["alice".to_string()]);
        assert!(prompt.contains("last 30 days"));
        assert!(prompt.contains("@alice"));
    }
}

//! Source Connectors
//!
//! Each connector wraps one external search surface and normalizes its
//! results into [`Post`] values.
//!
//! # Failure model
//!
//! Connectors implement [`Connector::fetch`], which returns a `Result` so the
//! implementation can use `?` freely. Callers never see that error: they go
//! through [`search`], which applies the connector's time budget and turns
//! any error or timeout into an empty list after logging it. An empty list
//! means "no signal", never "failure".
//!
//! # Connectors
//!
//! - [`reddit`] - Subreddit search plus per-thread detail for enrichment
//! - [`hacker_news`] - Algolia story search
//! - [`youtube`] - YouTube Data API search (no-op without a key)
//! - [`web`] - Model-backed web search with an HTML results fallback
//! - [`x`] - Model-backed X search, parsed by [`social_parse`]

pub mod hacker_news;
pub mod reddit;
pub mod social_parse;
pub mod web;
pub mod x;
pub mod youtube;

use crate::types::{AppError, Post, QueryType, Result, SourceKind};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What a phase asks a connector to search for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Phase 1: the whole source.
    #[default]
    Broad,
    /// Phase 2: only inside these communities.
    Communities(Vec<String>),
    /// Phase 2: only posts by these handles.
    Handles(Vec<String>),
}

/// Input handed to every connector.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub topic: String,
    pub query_type: QueryType,
    /// Expanded queries, original topic first
    pub queries: Vec<String>,
    pub scope: SearchScope,
}

impl SearchRequest {
    pub fn new(topic: impl Into<String>, query_type: QueryType, queries: Vec<String>) -> Self {
        let topic = topic.into();
        let queries = if queries.is_empty() {
            vec![topic.clone()]
        } else {
            queries
        };
        Self {
            topic,
            query_type,
            queries,
            scope: SearchScope::Broad,
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }
}

/// One external search surface.
#[async_trait]
pub trait Connector: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Upper bound on a whole `fetch` call
    fn budget(&self) -> Duration;

    /// Run the search. Errors are handled by [`search`].
    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<Post>>;
}

/// Run `connector` under its time budget. Never fails.
pub async fn search(connector: &dyn Connector, request: &SearchRequest) -> Vec<Post> {
    let started = Instant::now();
    let kind = connector.kind();

    match tokio::time::timeout(connector.budget(), connector.fetch(request)).await {
        Ok(Ok(posts)) => {
            info!(
                source = %kind,
                scope = ?request.scope,
                count = posts.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "source search completed"
            );
            posts
        }
        Ok(Err(e)) => {
            warn!(source = %kind, error = %e, "source search failed, continuing without it");
            Vec::new()
        }
        Err(_) => {
            warn!(
                source = %kind,
                budget_ms = connector.budget().as_millis() as u64,
                "source search timed out, continuing without it"
            );
            Vec::new()
        }
    }
}

/// Shared HTTP client with a fixed user agent.
pub(crate) fn http_client(user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map non-2xx responses to [`AppError::Upstream`].
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Upstream {
        status: status.as_u16(),
        message: body.chars().take(300).collect(),
    })
}

/// A URL cited by a model-backed search.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Citation {
    pub url: String,
    pub title: Option<String>,
}

/// Answer text and citations from a Responses API call.
#[derive(Debug, Default)]
pub(crate) struct ModelSearchOutput {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl ModelSearchOutput {
    fn cite(&mut self, citation: Citation) {
        if !self.citations.iter().any(|c| c.url == citation.url) {
            self.citations.push(citation);
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesPayload {
    #[serde(default)]
    output: Vec<OutputItem>,
    /// xAI also lists cited URLs at the top level
    #[serde(default)]
    citations: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    #[serde(rename = "type", default)]
    kind: String,
    url: Option<String>,
    title: Option<String>,
}

impl ResponsesPayload {
    fn into_output(self) -> ModelSearchOutput {
        let mut output = ModelSearchOutput::default();

        for item in self.output.into_iter().filter(|i| i.kind == "message") {
            for content in item.content.into_iter().filter(|c| c.kind == "output_text") {
                if !output.text.is_empty() {
                    output.text.push('\n');
                }
                output.text.push_str(&content.text);
                for annotation in content.annotations {
                    if annotation.kind != "url_citation" {
                        continue;
                    }
                    if let Some(url) = annotation.url {
                        output.cite(Citation {
                            url,
                            title: annotation.title,
                        });
                    }
                }
            }
        }

        for value in self.citations {
            let url = match value {
                serde_json::Value::String(url) => Some(url),
                serde_json::Value::Object(map) => map
                    .get("url")
                    .and_then(|u| u.as_str())
                    .map(String::from),
                _ => None,
            };
            if let Some(url) = url {
                output.cite(Citation { url, title: None });
            }
        }

        output
    }
}

/// POST a Responses API request with a server-side search tool attached.
pub(crate) async fn responses_search(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    body: &serde_json::Value,
    timeout: Duration,
) -> Result<ModelSearchOutput> {
    let url = format!("{}/responses", base_url.trim_end_matches('/'));
    debug!(url = %url, "model search request");

    let response = http
        .post(&url)
        .bearer_auth(api_key)
        .timeout(timeout)
        .json(body)
        .send()
        .await?;
    let payload: ResponsesPayload = ensure_success(response).await?.json().await?;
    Ok(payload.into_output())
}

/// Remove surrounding markdown code fences from model output.
pub(crate) fn strip_code_blocks(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Maximum length of a post body excerpt, in characters.
pub const BODY_EXCERPT_CHARS: usize = 500;

/// Maximum number of curated comment excerpts carried by a post.
pub const MAX_COMMENT_INSIGHTS: usize = 5;

// ============= Source Types =============

/// The upstream surface a [`Post`] was discovered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Link aggregator (subreddit search).
    Reddit,
    /// Tech-news story index.
    HackerNews,
    /// Video platform search.
    #[serde(rename = "youtube")]
    YouTube,
    /// LLM-mediated general web search.
    Web,
    /// LLM-mediated social network search.
    X,
}

impl SourceKind {
    /// Every source, in pipeline order.
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Reddit,
        SourceKind::HackerNews,
        SourceKind::YouTube,
        SourceKind::Web,
        SourceKind::X,
    ];

    /// Human-readable label used in prompts and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Reddit => "Reddit",
            SourceKind::HackerNews => "Hacker News",
            SourceKind::YouTube => "YouTube",
            SourceKind::Web => "Web",
            SourceKind::X => "X",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============= Post =============

/// A normalized piece of content from any source.
///
/// Posts are values: stages that need to change a post (enrichment) build a
/// new one with [`Post::enriched`] instead of mutating a shared instance.
/// `url` is the identity key used by deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub title: String,
    pub url: String,
    pub source: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    pub engagement_score: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_insights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement_ratio: Option<f64>,
}

impl Post {
    /// Create a post with no community, body, or enrichment data.
    pub fn new(
        source: SourceKind,
        title: impl Into<String>,
        url: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source,
            community: None,
            engagement_score: 0,
            comment_count: 0,
            created_at,
            body: None,
            comment_insights: None,
            engagement_ratio: None,
        }
    }

    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        let community = community.into();
        self.community = (!community.trim().is_empty()).then_some(community);
        self
    }

    pub fn with_engagement(mut self, score: i64, comments: i64) -> Self {
        self.engagement_score = score;
        self.comment_count = comments;
        self
    }

    /// Attach a body excerpt, truncated to [`BODY_EXCERPT_CHARS`]. Blank text clears it.
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = excerpt(body, BODY_EXCERPT_CHARS);
        self
    }

    pub fn with_engagement_ratio(mut self, ratio: f64) -> Self {
        self.engagement_ratio = Some(ratio.clamp(0.0, 1.0));
        self
    }

    /// Copy of this post carrying authoritative thread data.
    pub fn enriched(&self, detail: &EnrichmentUpdate) -> Post {
        let mut post = self.clone();
        post.engagement_score = detail.engagement_score;
        post.comment_count = detail.comment_count;
        post.engagement_ratio = detail.engagement_ratio.map(|r| r.clamp(0.0, 1.0));
        if let Some(body) = detail.body.as_deref().and_then(|b| excerpt(b, BODY_EXCERPT_CHARS)) {
            post.body = Some(body);
        }
        if !detail.comment_insights.is_empty() {
            post.comment_insights = Some(
                detail
                    .comment_insights
                    .iter()
                    .take(MAX_COMMENT_INSIGHTS)
                    .cloned()
                    .collect(),
            );
        }
        post
    }
}

/// Authoritative values applied to a post by the enrichment worker.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentUpdate {
    pub engagement_score: i64,
    pub comment_count: i64,
    pub engagement_ratio: Option<f64>,
    pub body: Option<String>,
    pub comment_insights: Vec<String>,
}

/// Trim `text` and cut it to at most `max_chars` characters on a char boundary.
pub fn excerpt(text: &str, max_chars: usize) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => Some(trimmed[..idx].trim_end().to_string()),
        None => Some(trimmed.to_string()),
    }
}

// ============= Query Types =============

/// Intent category of a research topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Recommendations,
    News,
    HowTo,
    General,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryType::Recommendations => "recommendations",
            QueryType::News => "news",
            QueryType::HowTo => "howto",
            QueryType::General => "general",
        };
        f.write_str(name)
    }
}

/// Drill-down targets discovered in phase 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntities {
    pub communities: Vec<String>,
    pub key_terms: Vec<String>,
    pub handles: Vec<String>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.communities.is_empty() && self.key_terms.is_empty() && self.handles.is_empty()
    }
}

// ============= Research Types =============

/// Aggregate statistics for a research run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchStats {
    pub run_id: Uuid,
    pub per_source_counts: BTreeMap<SourceKind, usize>,
    pub per_source_engagement_totals: BTreeMap<SourceKind, i64>,
    pub total_posts: usize,
    pub queries: Vec<String>,
    pub entities: ExtractedEntities,
    pub enriched_count: usize,
    pub phase_timings_ms: BTreeMap<String, u64>,
    pub synthesized_by_model: bool,
    pub timed_out: bool,
}

impl ResearchStats {
    /// Per-source counts and engagement totals over `posts`.
    pub fn tally(posts: &[Post]) -> Self {
        let mut stats = Self {
            total_posts: posts.len(),
            ..Self::default()
        };
        for post in posts {
            *stats.per_source_counts.entry(post.source).or_insert(0) += 1;
            *stats
                .per_source_engagement_totals
                .entry(post.source)
                .or_insert(0) += post.engagement_score;
        }
        stats
    }
}

/// Final output of the research pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub topic: String,
    pub query_type: QueryType,
    /// Markdown brief.
    pub brief: String,
    /// Ranked sources, best first.
    pub sources: Vec<Post>,
    pub stats: ResearchStats,
}

/// Caller input for a research run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    pub topic: String,
    /// Audience the brief should be written for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    /// Outer deadline override in seconds.
    #[serde(default, alias = "deadline_secs", skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
    /// Per-call synthesis credential. Never accepted over the wire.
    #[serde(skip)]
    pub model_credential: Option<String>,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No results found for topic: {0}")]
    NoResults(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::NoResults(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Http(_) | AppError::Upstream { .. } | AppError::LLM(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Parse(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

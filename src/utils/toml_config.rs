//! TOML-based configuration for trendscout
//!
//! All pipeline settings live in `trendscout.toml`. Every section has defaults,
//! so an empty file (or no file at all) yields a working configuration.
//!
//! Credentials are never written to the file. Each section names the
//! environment variable that holds its key (`api_key_env = "OPENAI_API_KEY"`),
//! and [`TrendscoutConfig::credentials`] resolves them once at startup into a
//! [`Credentials`] value that is injected into the coordinator.

use crate::research::ranking::RecencyPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest outer deadline a run may ask for, in seconds.
pub const MAX_DEADLINE_SECS: u64 = 3600;

/// Most videos the YouTube search API returns for one query.
pub const MAX_YOUTUBE_RESULTS: u32 = 10;

/// Root configuration structure loaded from trendscout.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendscoutConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub research: ResearchSettings,

    /// Recency window and ranking boosts shared by every connector and the ranker
    #[serde(default)]
    pub recency: RecencyPolicy,

    #[serde(default)]
    pub reddit: RedditConfig,

    #[serde(default)]
    pub hacker_news: HackerNewsConfig,

    #[serde(default)]
    pub youtube: YouTubeConfig,

    #[serde(default)]
    pub web: WebConfig,

    #[serde(default)]
    pub x: XConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSettings {
    /// Outer deadline for a whole research run
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Cap on ranked sources returned to the caller
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Number of ranked posts handed to the synthesizer
    #[serde(default = "default_synthesis_posts")]
    pub synthesis_posts: usize,

    /// Number of top Reddit posts considered for enrichment
    #[serde(default = "default_enrichment_limit")]
    pub enrichment_limit: usize,

    /// Concurrent thread fetches per enrichment batch
    #[serde(default = "default_enrichment_batch_size")]
    pub enrichment_batch_size: usize,

    /// Discovered communities searched in phase 2
    #[serde(default = "default_phase2_community_limit")]
    pub phase2_community_limit: usize,
}

fn default_deadline_secs() -> u64 {
    60
}

fn default_max_sources() -> usize {
    50
}

fn default_synthesis_posts() -> usize {
    40
}

fn default_enrichment_limit() -> usize {
    15
}

fn default_enrichment_batch_size() -> usize {
    5
}

fn default_phase2_community_limit() -> usize {
    5
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
            max_sources: default_max_sources(),
            synthesis_posts: default_synthesis_posts(),
            enrichment_limit: default_enrichment_limit(),
            enrichment_batch_size: default_enrichment_batch_size(),
            phase2_community_limit: default_phase2_community_limit(),
        }
    }
}

impl ResearchSettings {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs.min(MAX_DEADLINE_SECS))
    }
}

// ============= Source Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    #[serde(default = "default_reddit_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout
    #[serde(default = "default_short_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_reddit_limit")]
    pub limit: u32,
}

fn default_reddit_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_user_agent() -> String {
    format!("trendscout/{}", env!("CARGO_PKG_VERSION"))
}

fn default_short_timeout() -> u64 {
    10
}

fn default_reddit_limit() -> u32 {
    25
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: default_reddit_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_short_timeout(),
            limit: default_reddit_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackerNewsConfig {
    #[serde(default = "default_hn_url")]
    pub base_url: String,

    #[serde(default = "default_short_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_hn_hits")]
    pub hits_per_page: u32,
}

fn default_hn_url() -> String {
    "https://hn.algolia.com".to_string()
}

fn default_hn_hits() -> u32 {
    30
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_hn_url(),
            timeout_secs: default_short_timeout(),
            hits_per_page: default_hn_hits(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    #[serde(default = "default_youtube_url")]
    pub base_url: String,

    /// Environment variable containing the YouTube Data API key
    #[serde(default = "default_youtube_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_short_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_youtube_results")]
    pub max_results: u32,
}

fn default_youtube_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_youtube_key_env() -> String {
    "YOUTUBE_API_KEY".to_string()
}

fn default_youtube_results() -> u32 {
    10
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: default_youtube_url(),
            api_key_env: default_youtube_key_env(),
            timeout_secs: default_short_timeout(),
            max_results: default_youtube_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// OpenAI-compatible API base for the web search tool
    #[serde(default = "default_openai_base")]
    pub base_url: String,

    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_web_model")]
    pub model: String,

    /// Timeout for the model-backed search
    #[serde(default = "default_web_timeout")]
    pub timeout_secs: u64,

    /// HTML results page used when the model-backed search yields nothing
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,

    /// Timeout per fallback query
    #[serde(default = "default_fallback_timeout")]
    pub fallback_timeout_secs: u64,

    #[serde(default = "default_web_results")]
    pub max_results: usize,
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_web_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_web_timeout() -> u64 {
    60
}

fn default_fallback_url() -> String {
    "https://html.duckduckgo.com".to_string()
}

fn default_fallback_timeout() -> u64 {
    8
}

fn default_web_results() -> usize {
    15
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base(),
            api_key_env: default_openai_key_env(),
            model: default_web_model(),
            timeout_secs: default_web_timeout(),
            fallback_url: default_fallback_url(),
            fallback_timeout_secs: default_fallback_timeout(),
            max_results: default_web_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XConfig {
    #[serde(default = "default_xai_base")]
    pub base_url: String,

    #[serde(default = "default_xai_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_xai_model")]
    pub model: String,

    #[serde(default = "default_x_timeout")]
    pub timeout_secs: u64,
}

fn default_xai_base() -> String {
    "https://api.x.ai/v1".to_string()
}

fn default_xai_key_env() -> String {
    "XAI_API_KEY".to_string()
}

fn default_xai_model() -> String {
    "grok-4".to_string()
}

fn default_x_timeout() -> u64 {
    120
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            base_url: default_xai_base(),
            api_key_env: default_xai_key_env(),
            model: default_xai_model(),
            timeout_secs: default_x_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_openai_base")]
    pub base_url: String,

    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_synthesis_model")]
    pub model: String,

    #[serde(default = "default_synthesis_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,
}

fn default_synthesis_model() -> String {
    "gpt-4.1".to_string()
}

fn default_synthesis_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.4
}

fn default_synthesis_timeout() -> u64 {
    90
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base(),
            api_key_env: default_openai_key_env(),
            model: default_synthesis_model(),
            max_tokens: default_synthesis_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_synthesis_timeout(),
        }
    }
}

// ============= Credentials =============

/// Resolved third-party credentials. `None` disables the dependent feature.
#[derive(Clone, Default)]
pub struct Credentials {
    pub youtube: Option<String>,
    pub web_search: Option<String>,
    pub x_search: Option<String>,
    pub synthesis: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("youtube", &self.youtube.is_some())
            .field("web_search", &self.web_search.is_some())
            .field("x_search", &self.x_search.is_some())
            .field("synthesis", &self.synthesis.is_some())
            .finish()
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(err: ConfigError) -> Self {
        crate::types::AppError::Config(err.to_string())
    }
}

impl TrendscoutConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: TrendscoutConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate numeric limits and the recency policy
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            ("reddit.timeout_secs", self.reddit.timeout_secs),
            ("hacker_news.timeout_secs", self.hacker_news.timeout_secs),
            ("youtube.timeout_secs", self.youtube.timeout_secs),
            ("web.timeout_secs", self.web.timeout_secs),
            ("web.fallback_timeout_secs", self.web.fallback_timeout_secs),
            ("x.timeout_secs", self.x.timeout_secs),
            ("synthesis.timeout_secs", self.synthesis.timeout_secs),
            ("research.deadline_secs", self.research.deadline_secs),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        let caps = [
            ("research.max_sources", self.research.max_sources),
            ("research.synthesis_posts", self.research.synthesis_posts),
            (
                "research.enrichment_batch_size",
                self.research.enrichment_batch_size,
            ),
            ("web.max_results", self.web.max_results),
        ];
        for (name, value) in caps {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        if self.research.deadline_secs > MAX_DEADLINE_SECS {
            return Err(ConfigError::ValidationError(format!(
                "research.deadline_secs must be at most {}",
                MAX_DEADLINE_SECS
            )));
        }
        if self.youtube.max_results == 0 || self.youtube.max_results > MAX_YOUTUBE_RESULTS {
            return Err(ConfigError::ValidationError(format!(
                "youtube.max_results must be between 1 and {}",
                MAX_YOUTUBE_RESULTS
            )));
        }

        self.recency
            .validate()
            .map_err(ConfigError::ValidationError)?;

        Ok(())
    }

    /// Get a resolved value from an env var reference. Empty values count as unset.
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Resolve every credential named in the configuration
    pub fn credentials(&self) -> Credentials {
        Credentials {
            youtube: self.resolve_env(&self.youtube.api_key_env),
            web_search: self.resolve_env(&self.web.api_key_env),
            x_search: self.resolve_env(&self.x.api_key_env),
            synthesis: self.resolve_env(&self.synthesis.api_key_env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TrendscoutConfig::from_toml("").expect("empty config is valid");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.research.deadline_secs, 60);
        assert_eq!(config.research.max_sources, 50);
        assert_eq!(config.research.synthesis_posts, 40);
        assert_eq!(config.research.enrichment_limit, 15);
        assert_eq!(config.research.enrichment_batch_size, 5);
        assert_eq!(config.reddit.timeout_secs, 10);
        assert_eq!(config.hacker_news.timeout_secs, 10);
        assert_eq!(config.web.timeout_secs, 60);
        assert_eq!(config.web.fallback_timeout_secs, 8);
        assert_eq!(config.x.timeout_secs, 120);
        assert_eq!(config.youtube.max_results, 10);
        assert_eq!(config.recency.window_days, 30);
    }

    #[test]
    fn test_parse_partial_config() {
        let content = r#"
[server]
port = 8080
log_level = "debug"

[research]
deadline_secs = 30

[reddit]
base_url = "http://localhost:9999"

[x]
model = "grok-3"
"#;
        let config = TrendscoutConfig::from_toml(content).expect("Failed to parse config");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.research.deadline_secs, 30);
        assert_eq!(config.research.max_sources, 50);
        assert_eq!(config.reddit.base_url, "http://localhost:9999");
        assert_eq!(config.reddit.limit, 25);
        assert_eq!(config.x.model, "grok-3");
        assert_eq!(config.x.api_key_env, "XAI_API_KEY");
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let result = TrendscoutConfig::from_toml("[hacker_news]\ntimeout_secs = 0\n");
        match result {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("hacker_news.timeout_secs"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_zero_batch_size() {
        let result = TrendscoutConfig::from_toml("[research]\nenrichment_batch_size = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_rejects_oversized_deadline() {
        let result = TrendscoutConfig::from_toml("[research]\ndeadline_secs = 86400\n");
        match result {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("research.deadline_secs"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let longest = format!("[research]\ndeadline_secs = {}\n", MAX_DEADLINE_SECS);
        assert!(TrendscoutConfig::from_toml(&longest).is_ok());
    }

    #[test]
    fn test_validation_caps_youtube_results() {
        for toml in ["[youtube]\nmax_results = 11\n", "[youtube]\nmax_results = 0\n"] {
            match TrendscoutConfig::from_toml(toml) {
                Err(ConfigError::ValidationError(msg)) => {
                    assert!(msg.contains("youtube.max_results"))
                }
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = TrendscoutConfig::load("/nonexistent/trendscout.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

        let fallback = TrendscoutConfig::load_or_default("/nonexistent/trendscout.toml")
            .expect("defaults when file is missing");
        assert_eq!(fallback.server.port, 3000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[youtube]\nmax_results = 5").unwrap();

        let config = TrendscoutConfig::load(file.path()).unwrap();
        assert_eq!(config.youtube.max_results, 5);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped = TrendscoutConfig::from_toml(include_str!("../../trendscout.toml"))
            .expect("shipped trendscout.toml is valid");
        let defaults = TrendscoutConfig::default();

        assert_eq!(shipped.recency, defaults.recency);
        assert_eq!(shipped.research.deadline_secs, defaults.research.deadline_secs);
        assert_eq!(shipped.web.fallback_url, defaults.web.fallback_url);
        assert_eq!(shipped.synthesis.model, defaults.synthesis.model);
        assert_eq!(shipped.x.timeout_secs, defaults.x.timeout_secs);
    }

    #[test]
    fn test_unset_env_resolves_to_none() {
        let config = TrendscoutConfig::default();
        assert!(config
            .resolve_env("TRENDSCOUT_TEST_SURELY_UNSET_VARIABLE")
            .is_none());
    }

    #[test]
    fn test_credentials_debug_hides_values() {
        let creds = Credentials {
            synthesis: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("synthesis: true"));
    }
}

//! # trendscout - Deep Research for Community & Social Trends
//!
//! Given a free-text topic, trendscout searches Reddit, Hacker News, YouTube,
//! the open web and X concurrently, drills into the communities and accounts
//! those results point at, pulls full discussion threads for the strongest
//! Reddit posts, ranks everything by engagement and recency, and writes a
//! markdown brief. Partial results are always preferred over failure.
//!
//! ## Overview
//!
//! trendscout can be used in three ways:
//!
//! 1. **As a CLI** - `trendscout research "best CRM for startups"`
//! 2. **As a server** - `trendscout serve`, then `POST /api/research`
//! 3. **As a library** - Build a [`ResearchCoordinator`] and call it directly
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use trendscout::{ResearchCoordinator, ResearchRequest, TrendscoutConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TrendscoutConfig::load_or_default("trendscout.toml")?;
//!     let coordinator = ResearchCoordinator::new(&config, config.credentials());
//!
//!     let mut request = ResearchRequest::new("latest news on OpenAI");
//!     request.persona = Some("newsletter readers".into());
//!
//!     let result = coordinator.research(&request).await?;
//!     println!("{}", result.brief);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`research`] - Classifier, expander, entity extraction, enrichment, ranking, synthesis, orchestration
//! - [`sources`] - Source connectors and the infallible search wrapper
//! - [`llm`] - LLM client used for synthesis
//! - [`api`] - REST API handlers and routes
//! - [`cli`] - Command-line parsing and terminal output
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration
//!
//! ## Configuration
//!
//! All tuning lives in `trendscout.toml`; every key has a default so the file
//! may be empty or absent. Credentials are never written to the file. Each
//! section names the environment variable that holds its key, and a missing
//! key disables the feature that needs it instead of failing the run.

#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM client implementations.
pub mod llm;
/// The research pipeline.
pub mod research;
/// Source connectors.
pub mod sources;
/// Core types (posts, results, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

use std::sync::Arc;

// Re-export commonly used types
pub use llm::{LLMClient, OpenAIClient};
pub use research::coordinator::ResearchCoordinator;
pub use research::ranking::RecencyPolicy;
pub use sources::{Connector, SearchRequest, SearchScope};
pub use types::{AppError, Post, ResearchRequest, ResearchResult, Result, SourceKind};
pub use utils::toml_config::{Credentials, TrendscoutConfig};

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<TrendscoutConfig>,
    /// Pipeline shared by every request
    pub coordinator: Arc<ResearchCoordinator>,
}

impl AppState {
    /// Build the production state from configuration.
    pub fn from_config(config: TrendscoutConfig) -> Self {
        let coordinator = ResearchCoordinator::new(&config, config.credentials());
        Self {
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
        }
    }
}

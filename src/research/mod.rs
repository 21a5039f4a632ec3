//! Deep-Research Pipeline
//!
//! Turns a free-text topic into a ranked set of sources and a synthesized
//! brief. The stages are plain functions or small workers so each can be
//! tested on its own; [`coordinator::ResearchCoordinator`] sequences them.
//!
//! # Usage
//!
//! ```ignore
//! use trendscout::research::coordinator::ResearchCoordinator;
//! use trendscout::types::ResearchRequest;
//! use trendscout::utils::toml_config::TrendscoutConfig;
//!
//! let config = TrendscoutConfig::load_or_default("trendscout.toml")?;
//! let coordinator = ResearchCoordinator::new(&config, config.credentials());
//!
//! let result = coordinator
//!     .research(&ResearchRequest::new("best CRM for startups"))
//!     .await?;
//!
//! println!("{}", result.brief);
//! for post in result.sources.iter().take(5) {
//!     println!("- {} ({})", post.title, post.url);
//! }
//! ```
//!
//! # Research Workflow
//!
//! 1. **Classification & expansion** - Pick an intent and build query variants
//! 2. **Broad search** - Query every source concurrently
//! 3. **Drill-down** - Search the communities and handles found in step 2
//! 4. **Enrichment** - Pull full threads for the strongest Reddit posts
//! 5. **Ranking & synthesis** - Deduplicate, score, and write the brief

/// Topic intent classification.
pub mod classifier;
/// Four-phase pipeline orchestration.
pub mod coordinator;
/// Thread enrichment worker.
pub mod enrichment;
/// Drill-down target extraction.
pub mod entities;
/// Query variants per intent.
pub mod expander;
/// Deduplication, scoring, and the recency policy.
pub mod ranking;
/// Brief generation with a deterministic fallback.
pub mod synthesizer;

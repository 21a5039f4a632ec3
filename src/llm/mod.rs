//! LLM Provider Clients and Abstractions
//!
//! The research pipeline talks to language models in two places: the
//! model-backed search connectors (which use provider-specific search tools
//! and live in [`crate::sources`]) and final synthesis, which only needs a
//! single-shot system + user completion. This module covers the latter.
//!
//! - [`LLMClient`] - The trait the synthesizer depends on
//! - [`OpenAIClient`] - Chat-completions client for OpenAI-compatible APIs
//!
//! # Example
//!
//! ```ignore
//! use trendscout::llm::{LLMClient, OpenAIClient};
//!
//! let client = OpenAIClient::new(api_key, "https://api.openai.com/v1".into(), "gpt-4.1".into());
//! let brief = client.generate_with_system("You are an analyst.", "Summarize...").await?;
//! ```

/// Core LLM client trait and inference parameters.
pub mod client;
/// OpenAI-compatible chat completions client.
pub mod openai;

pub use client::{LLMClient, ModelParams};
pub use openai::OpenAIClient;

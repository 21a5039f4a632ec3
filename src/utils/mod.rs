//! Configuration utilities.

/// TOML configuration loading, validation and credential resolution.
pub mod toml_config;

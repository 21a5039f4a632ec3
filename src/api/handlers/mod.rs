//! API request handlers.

/// Liveness probe.
pub mod health;
/// Research pipeline handler.
pub mod research;

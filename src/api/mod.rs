//! HTTP API Handlers and Routes
//!
//! The REST surface of trendscout, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Research (`/api/research`)
//! - `POST /api/research` - Run the research pipeline and return the ranked sources and brief
//!
//! ## Health
//! - `GET /health` - Liveness probe
//!
//! # Errors
//!
//! Handlers return [`AppError`](crate::types::AppError), rendered as
//! `{"error": "..."}` with a status code chosen per variant: a blank topic is
//! `400` and a topic with no sources at all is `404`.

/// HTTP request handlers for all API endpoints.
pub mod handlers;
/// Route configuration and router setup.
pub mod routes;

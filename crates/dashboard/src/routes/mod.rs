//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Page
//! GET  /                       - Controls, caption and map
//!
//! # Control handlers (JSON)
//! GET  /api/materials          - Material dropdown options for ?category=
//! GET  /api/buyers             - Buyer markers and caption for
//!                                ?seller=&category=&material=&distance=
//! ```

pub mod api;
pub mod dashboard;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create all routes for the dashboard.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/health", get(health))
        .nest("/api", api::routes())
}

/// Liveness health check endpoint.
///
/// The Salesforce snapshot is loaded before the server binds, so a running
/// server is always ready.
async fn health() -> &'static str {
    "ok"
}

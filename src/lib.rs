//! revdiff - which commits does one revision have that the other doesn't?
//!
//! Compares two revisions of one or more GitHub repositories and reports,
//! per repository, the commits unique to each side.
//!
//! - `github`: commit-history fetching and failure classification
//! - `diff`: the two-listing diff and concurrent batch orchestration
//! - `models`: request/response DTOs
//! - `routes`: HTTP endpoints

pub mod diff;
pub mod error;
pub mod github;
pub mod models;
pub mod routes;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Full HTTP application: API routes plus CORS and request tracing layers.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::create_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

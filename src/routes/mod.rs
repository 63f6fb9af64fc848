//! API route handlers - maps HTTP endpoints to the diff engine.
//!
//! Each submodule defines routes for a feature area:
//! - `diff`: Batch revision diff (POST /diff, POST /api/v1/diff)
//! - `health`: Liveness probe (GET /api/v1/health)

pub mod diff;
pub mod health;

use std::sync::Arc;

use axum::Router;

use crate::diff::{BatchOrchestrator, BatchPolicy};

/// Shared handler state. Cheap to clone; holds no per-request data.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
    pub policy: BatchPolicy,
    /// Upstream API base URL, reported by the health probe.
    pub upstream: String,
}

impl AppState {
    pub fn new(
        orchestrator: BatchOrchestrator,
        policy: BatchPolicy,
        upstream: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            policy,
            upstream: upstream.into(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(diff::routes(state.clone()))
        .merge(health::routes(state))
}

//! Batch revision diff endpoint.
//!
//! POST /diff (also POST /api/v1/diff)
//! Body: `[{ "repository": "owner/name", "revisions": [a, b], "github_api_key"?: token }]`
//!
//! Returns one item per request entry, in request order:
//! `{ "repository", "revisions_diff": { a: [sha...], b: [sha...] } }`.
//!
//! Bodies that do not parse (bad JSON, not exactly two revisions) and entries
//! whose repository is not `owner/name` are rejected with 400 before any fetch.
//!
//! Under the all-or-nothing policy any failed fetch turns the whole response
//! into that fetch's error status. Under the partial policy failed entries
//! come back inline as `{ "repository", "error": {...} }` with a 200.

use axum::{Json, Router, extract::State, extract::rejection::JsonRejection, routing::post};

use crate::diff::{BatchPolicy, EntryOutcome};
use crate::error::{AppError, Result};
use crate::models::{DiffResult, FailedDiff, RepositoryDiffRequest};
use crate::routes::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/diff", post(compute_diffs))
        .route("/api/v1/diff", post(compute_diffs))
        .with_state(state)
}

async fn compute_diffs(
    State(state): State<AppState>,
    body: std::result::Result<Json<Vec<RepositoryDiffRequest>>, JsonRejection>,
) -> Result<Json<Vec<DiffResult>>> {
    let Json(requests) = body?;
    for (index, request) in requests.iter().enumerate() {
        request
            .validate()
            .map_err(|msg| AppError::InvalidRequest(format!("entry {}: {}", index, msg)))?;
    }

    let results: Vec<DiffResult> = match state.policy {
        BatchPolicy::AllOrNothing => state
            .orchestrator
            .run(requests)
            .await?
            .into_iter()
            .map(|(_, diff)| DiffResult::Diff(diff))
            .collect(),
        BatchPolicy::Partial => {
            let outcomes = state.orchestrator.run_each(&requests).await;
            requests
                .into_iter()
                .zip(outcomes)
                .map(|(request, outcome)| match outcome {
                    EntryOutcome::Success(diff) => DiffResult::Diff(diff),
                    EntryOutcome::Failure(error) => DiffResult::Failed(FailedDiff {
                        repository: request.repository,
                        error,
                    }),
                })
                .collect()
        }
    };

    Ok(Json(results))
}

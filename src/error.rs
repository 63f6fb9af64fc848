//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` for every failure the diff endpoint can report and
//! implements Axum's `IntoResponse` so each fetch-failure kind gets its own
//! status with a JSON error body.
//!
//! Error mappings:
//! - `InvalidRequest`, `InvalidBody` (malformed JSON, wrong revision count) → 400
//! - fetch `NotFound` → 404 (also returned for private repositories without a valid credential)
//! - fetch `Unauthorized` → 401
//! - fetch `RateLimited` → 429
//! - fetch `Transient` → 503
//! - fetch `Unknown` → 502

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::diff::BatchError;
use crate::github::FetchErrorKind;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

pub fn status_for(kind: FetchErrorKind) -> StatusCode {
    match kind {
        FetchErrorKind::NotFound => StatusCode::NOT_FOUND,
        FetchErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        FetchErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        FetchErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        FetchErrorKind::Unknown => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": format!("Invalid request: {}", msg),
                    "kind": "invalid_request",
                }),
            ),
            AppError::InvalidBody(_) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": self.to_string(),
                    "kind": "invalid_request",
                }),
            ),
            AppError::Batch(e) => {
                let fetch = &e.source;
                (
                    status_for(fetch.kind),
                    json!({
                        "error": format!("Error fetching commits: {}", fetch),
                        "kind": fetch.kind,
                        "index": e.index,
                        "repository": fetch.repository,
                        "revision": fetch.revision,
                        "upstream_status": fetch.status,
                    }),
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let AppError::Batch(e) = &self {
            if let Some(secs) = e.source.retry_after {
                response
                    .headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, secs.into());
            }
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::FetchError;

    #[test]
    fn each_kind_has_a_distinct_status() {
        let kinds = [
            FetchErrorKind::NotFound,
            FetchErrorKind::Unauthorized,
            FetchErrorKind::RateLimited,
            FetchErrorKind::Transient,
            FetchErrorKind::Unknown,
        ];
        let statuses: std::collections::HashSet<StatusCode> =
            kinds.iter().map(|k| status_for(*k)).collect();

        assert_eq!(statuses.len(), kinds.len());
        assert_eq!(status_for(FetchErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(FetchErrorKind::Unauthorized), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let mut source = FetchError::new(FetchErrorKind::RateLimited, "a/b", "main", "slow down");
        source.retry_after = Some(42);
        let response = AppError::Batch(BatchError { index: 3, source }).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[axum::http::header::RETRY_AFTER], "42");
    }

    #[test]
    fn invalid_request_is_bad_request() {
        let response = AppError::InvalidRequest("empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

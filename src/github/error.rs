//! Fetch failure taxonomy.
//!
//! Every failed commit-history fetch is classified into one `FetchErrorKind`
//! and carries the repository/revision that triggered it, so callers can
//! translate each kind into its own outward status instead of one generic
//! failure.
//!
//! Status mapping (upstream HTTP status → kind):
//! - 404 → `NotFound`
//! - 401, 403 → `Unauthorized`
//! - 429 → `RateLimited`
//! - 5xx, or no response at all (connect/timeout) → `Transient`
//! - anything else, or an undecodable body → `Unknown`
//!
//! `NotFound` is also what the upstream API reports for a private repository
//! requested without a valid credential. The two cases cannot be told apart.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Repository or revision does not exist, or is not visible with the
    /// supplied credential.
    NotFound,
    /// Credential rejected or lacking privilege (401/403).
    Unauthorized,
    /// Upstream asked us to slow down (429). Back-off is the caller's call.
    RateLimited,
    /// Network-level or server-side failure; safe to retry.
    Transient,
    /// Anything we could not classify.
    Unknown,
}

impl FetchErrorKind {
    /// Classifies a non-success upstream status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => FetchErrorKind::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchErrorKind::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => FetchErrorKind::RateLimited,
            s if s.is_server_error() => FetchErrorKind::Transient,
            _ => FetchErrorKind::Unknown,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FetchErrorKind::NotFound => "not found",
            FetchErrorKind::Unauthorized => "unauthorized",
            FetchErrorKind::RateLimited => "rate limited",
            FetchErrorKind::Transient => "transient failure",
            FetchErrorKind::Unknown => "unknown failure",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} fetching commits for {repository}@{revision}: {detail}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub repository: String,
    pub revision: String,
    /// Upstream HTTP status, absent when no response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Seconds from the upstream `Retry-After` header, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    pub detail: String,
}

impl FetchError {
    pub fn new(
        kind: FetchErrorKind,
        repository: impl Into<String>,
        revision: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            repository: repository.into(),
            revision: revision.into(),
            status: None,
            retry_after: None,
            detail: detail.into(),
        }
    }

    /// Builds an error from a non-success upstream response.
    pub fn from_status(
        repository: &str,
        revision: &str,
        status: StatusCode,
        retry_after: Option<u64>,
        body: &str,
    ) -> Self {
        let detail = upstream_message(body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unexpected status").to_string());

        Self {
            status: Some(status.as_u16()),
            retry_after,
            ..Self::new(FetchErrorKind::from_status(status), repository, revision, detail)
        }
    }

    /// Builds an error from a transport failure.
    pub fn from_transport(repository: &str, revision: &str, err: &reqwest::Error) -> Self {
        let kind = if err.is_connect() || err.is_timeout() || err.is_request() {
            FetchErrorKind::Transient
        } else {
            FetchErrorKind::Unknown
        };

        Self {
            status: err.status().map(|s| s.as_u16()),
            ..Self::new(kind, repository, revision, err.to_string())
        }
    }

    pub fn timed_out(repository: &str, revision: &str, limit: Duration) -> Self {
        Self::new(
            FetchErrorKind::Transient,
            repository,
            revision,
            format!("no response within {}ms", limit.as_millis()),
        )
    }
}

/// GitHub error bodies look like `{"message": "...", "documentation_url": "..."}`.
fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}

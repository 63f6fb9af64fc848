//! Commit-history fetching.
//!
//! `CommitFetcher` is the seam between the diff engine and the remote API.
//! `GithubFetcher` is the production implementation: one
//! `GET /repos/{owner}/{name}/commits?sha={revision}` per call, first page only,
//! no retries and no caching. Repository names that are not exactly
//! `owner/name` never leave the process.

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION, RETRY_AFTER};
use serde::Deserialize;

use crate::github::error::{FetchError, FetchErrorKind};
use crate::models::CommitList;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Fetches the commit identifiers reachable from a revision.
#[async_trait]
pub trait CommitFetcher: Send + Sync {
    /// Returns commit identifiers in upstream response order. `credential`,
    /// when present, is sent as the authorization token; otherwise the request
    /// is anonymous.
    async fn fetch(
        &self,
        repository: &str,
        revision: &str,
        credential: Option<&str>,
    ) -> Result<CommitList, FetchError>;
}

/// Only the SHA of each commit object is used.
#[derive(Debug, Deserialize)]
struct CommitSummary {
    sha: String,
}

#[derive(Debug, Clone)]
pub struct GithubFetcher {
    client: reqwest::Client,
    api_url: String,
    per_page: Option<u8>,
}

impl GithubFetcher {
    pub fn new(api_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            per_page: None,
        })
    }

    /// Asks upstream for `per_page` commits on the (single) page we read.
    pub fn with_per_page(mut self, per_page: u8) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `{api}/repos/{owner}/{name}/commits`, each segment percent-encoded.
    fn commits_url(&self, repository: &str, revision: &str) -> Result<Url, FetchError> {
        let (owner, name) = split_repository(repository).ok_or_else(|| {
            FetchError::new(
                FetchErrorKind::NotFound,
                repository,
                revision,
                "repository must be of the form owner/name",
            )
        })?;

        let mut url = Url::parse(&self.api_url).map_err(|e| {
            FetchError::new(
                FetchErrorKind::Unknown,
                repository,
                revision,
                format!("invalid API URL {}: {e}", self.api_url),
            )
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::new(
                    FetchErrorKind::Unknown,
                    repository,
                    revision,
                    format!("API URL {} cannot take a path", self.api_url),
                )
            })?
            .pop_if_empty()
            .extend(["repos", owner, name, "commits"]);
        Ok(url)
    }
}

/// Splits `owner/name` into its two segments. Anything else (extra or empty
/// segments, `.`/`..`, query or fragment markers, backslashes) is rejected so
/// a repository string can only ever address its own commits listing.
pub fn split_repository(repository: &str) -> Option<(&str, &str)> {
    let (owner, name) = repository.split_once('/')?;
    let valid = |segment: &str| {
        !segment.is_empty()
            && segment != "."
            && segment != ".."
            && !segment.contains(['/', '?', '#', '\\'])
            && !segment.chars().any(char::is_whitespace)
    };
    (valid(owner) && valid(name)).then_some((owner, name))
}

#[async_trait]
impl CommitFetcher for GithubFetcher {
    #[tracing::instrument(level = "debug", skip(self, credential), fields(authenticated = credential.is_some()))]
    async fn fetch(
        &self,
        repository: &str,
        revision: &str,
        credential: Option<&str>,
    ) -> Result<CommitList, FetchError> {
        let url = self.commits_url(repository, revision)?;
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .query(&[("sha", revision)]);

        if let Some(per_page) = self.per_page {
            request = request.query(&[("per_page", per_page)]);
        }
        if let Some(token) = credential {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_transport(repository, revision, &e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let body = response.text().await.unwrap_or_default();
            let err = FetchError::from_status(repository, revision, status, retry_after, &body);
            tracing::debug!(status = status.as_u16(), kind = %err.kind, "upstream rejected commit listing");
            return Err(err);
        }

        let commits: Vec<CommitSummary> = response.json().await.map_err(|e| {
            FetchError::new(
                FetchErrorKind::Unknown,
                repository,
                revision,
                format!("unreadable commit listing: {e}"),
            )
        })?;

        tracing::debug!(count = commits.len(), "fetched commit listing");
        Ok(commits.into_iter().map(|c| c.sha).collect())
    }
}

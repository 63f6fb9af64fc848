//! Batch orchestration.
//!
//! Runs every entry of a batch concurrently (two fetches per entry, also
//! concurrent), diffs each entry, and returns results in request order no
//! matter which fetch finishes first.
//!
//! Two failure policies:
//! - `run`: all-or-nothing. The first classified error to arrive fails the
//!   whole batch and the remaining in-flight fetches are dropped.
//! - `run_each`: one `EntryOutcome` per request; failures never cross the
//!   entry boundary.
//!
//! Nothing is spawned onto the runtime, so dropping the returned future
//! abandons every outstanding fetch with it.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, try_join_all};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::diff::engine::diff_commits;
use crate::github::{CommitFetcher, FetchError, FetchErrorKind};
use crate::models::{CommitList, Credential, RepositoryDiffRequest, RevisionsDiff};

/// Which failure policy the HTTP layer applies to a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BatchPolicy {
    /// Any failed fetch fails the whole batch.
    #[default]
    AllOrNothing,
    /// Each entry reports its own diff or error.
    Partial,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("batch entry {index} failed: {source}")]
pub struct BatchError {
    /// Position of the failing entry in the request batch.
    pub index: usize,
    pub source: FetchError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Success(RevisionsDiff),
    Failure(FetchError),
}

impl EntryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EntryOutcome::Success(_))
    }
}

pub struct BatchOrchestrator {
    fetcher: Arc<dyn CommitFetcher>,
    limiter: Option<Semaphore>,
    fetch_timeout: Option<Duration>,
}

impl BatchOrchestrator {
    /// Unbounded fan-out, no timeout.
    pub fn new(fetcher: Arc<dyn CommitFetcher>) -> Self {
        Self {
            fetcher,
            limiter: None,
            fetch_timeout: None,
        }
    }

    /// Caps simultaneous outbound fetches across the whole orchestrator.
    pub fn with_max_concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.limiter = Some(Semaphore::new(limit.get()));
        self
    }

    /// Fails any single fetch that takes longer than `limit` as `Transient`.
    pub fn with_fetch_timeout(mut self, limit: Duration) -> Self {
        self.fetch_timeout = Some(limit);
        self
    }

    /// All-or-nothing: every diff in request order, or the first error observed.
    pub async fn run(
        &self,
        requests: Vec<RepositoryDiffRequest>,
    ) -> Result<Vec<(RepositoryDiffRequest, RevisionsDiff)>, BatchError> {
        tracing::info!(entries = requests.len(), "diffing batch (all-or-nothing)");

        let diffs = try_join_all(requests.iter().enumerate().map(|(index, request)| async move {
            self.diff_entry(request)
                .await
                .map_err(|source| BatchError { index, source })
        }))
        .await
        .inspect_err(|e| {
            tracing::warn!(
                index = e.index,
                repository = %e.source.repository,
                revision = %e.source.revision,
                kind = %e.source.kind,
                "batch aborted"
            );
        })?;

        Ok(requests.into_iter().zip(diffs).collect())
    }

    /// Partial success: one outcome per request, in request order.
    pub async fn run_each(&self, requests: &[RepositoryDiffRequest]) -> Vec<EntryOutcome> {
        tracing::info!(entries = requests.len(), "diffing batch (partial)");

        let outcomes: Vec<EntryOutcome> = join_all(requests.iter().map(|request| async move {
            match self.diff_entry(request).await {
                Ok(diff) => EntryOutcome::Success(diff),
                Err(err) => {
                    tracing::warn!(
                        repository = %err.repository,
                        revision = %err.revision,
                        kind = %err.kind,
                        "batch entry failed"
                    );
                    EntryOutcome::Failure(err)
                }
            }
        }))
        .await;

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        if failed > 0 {
            tracing::info!(failed, entries = outcomes.len(), "batch finished with failures");
        }
        outcomes
    }

    #[tracing::instrument(level = "debug", skip_all, fields(repository = %request.repository))]
    async fn diff_entry(&self, request: &RepositoryDiffRequest) -> Result<RevisionsDiff, FetchError> {
        let [revision_a, revision_b] = &request.revisions;
        let credential = request.credential.as_ref().map(Credential::expose);

        let (commits_a, commits_b) = tokio::try_join!(
            self.fetch(&request.repository, revision_a, credential),
            self.fetch(&request.repository, revision_b, credential),
        )?;

        let diff = diff_commits(&commits_a, revision_a, &commits_b, revision_b);
        Ok(RevisionsDiff::new(request.repository.clone(), diff))
    }

    async fn fetch(
        &self,
        repository: &str,
        revision: &str,
        credential: Option<&str>,
    ) -> Result<CommitList, FetchError> {
        let _permit = match &self.limiter {
            Some(limiter) => Some(limiter.acquire().await.map_err(|_| {
                FetchError::new(FetchErrorKind::Unknown, repository, revision, "fetch limiter closed")
            })?),
            None => None,
        };

        let fetch = self.fetcher.fetch(repository, revision, credential);
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| FetchError::timed_out(repository, revision, limit))?,
            None => fetch.await,
        }
    }
}

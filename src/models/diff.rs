//! Revision-diff DTOs.
//!
//! - `RepositoryDiffRequest`: one batch entry (repository + two revisions + optional token)
//! - `CommitDiff`: revision → commits unique to it, always exactly two keys in request order
//! - `RevisionsDiff`: a `CommitDiff` labelled with its repository
//! - `DiffResult`: per-entry response item, a diff or a classified failure
//!
//! Wire names follow the original service: `github_api_key` on requests and
//! `revisions_diff` on responses.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::github::FetchError;
use crate::github::client::split_repository;

/// Commit identifiers in upstream response order. Duplicates are kept.
pub type CommitList = Vec<String>;

/// Opaque per-request token. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryDiffRequest {
    /// `owner/name`
    pub repository: String,
    pub revisions: [String; 2],
    #[serde(default, rename = "github_api_key")]
    pub credential: Option<Credential>,
}

impl RepositoryDiffRequest {
    pub fn new(
        repository: impl Into<String>,
        revision_a: impl Into<String>,
        revision_b: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            revisions: [revision_a.into(), revision_b.into()],
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Rejects entries no fetch could succeed for. Revision syntax is not
    /// checked; upstream is authoritative.
    pub fn validate(&self) -> Result<(), String> {
        if self.repository.trim().is_empty() {
            return Err("repository must not be empty".to_string());
        }
        if split_repository(&self.repository).is_none() {
            return Err(format!(
                "repository '{}' must be of the form owner/name",
                self.repository
            ));
        }
        let [a, b] = &self.revisions;
        if a.trim().is_empty() || b.trim().is_empty() {
            return Err(format!("{}: revisions must not be empty", self.repository));
        }
        if a == b {
            return Err(format!(
                "{}: revisions must differ, got '{}' twice",
                self.repository, a
            ));
        }
        Ok(())
    }
}

/// Commits unique to each of two revisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDiff {
    sides: [(String, CommitList); 2],
}

impl CommitDiff {
    pub fn new(
        revision_a: String,
        unique_a: CommitList,
        revision_b: String,
        unique_b: CommitList,
    ) -> Self {
        Self {
            sides: [(revision_a, unique_a), (revision_b, unique_b)],
        }
    }

    /// Commits reachable from `revision` but not from the other one.
    pub fn unique_to(&self, revision: &str) -> Option<&[String]> {
        self.sides
            .iter()
            .find(|(rev, _)| rev == revision)
            .map(|(_, commits)| commits.as_slice())
    }

    pub fn revisions(&self) -> [&str; 2] {
        [self.sides[0].0.as_str(), self.sides[1].0.as_str()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.sides
            .iter()
            .map(|(rev, commits)| (rev.as_str(), commits.as_slice()))
    }
}

impl Serialize for CommitDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sides.len()))?;
        for (revision, commits) in &self.sides {
            map.serialize_entry(revision, commits)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionsDiff {
    repository: String,
    #[serde(rename = "revisions_diff")]
    diff: CommitDiff,
}

impl RevisionsDiff {
    pub fn new(repository: impl Into<String>, diff: CommitDiff) -> Self {
        Self {
            repository: repository.into(),
            diff,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn diff(&self) -> &CommitDiff {
        &self.diff
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDiff {
    pub repository: String,
    pub error: FetchError,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DiffResult {
    Diff(RevisionsDiff),
    Failed(FailedDiff),
}

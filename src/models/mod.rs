//! Data transfer objects for the diff API.
//!
//! - `diff`: RepositoryDiffRequest, RevisionsDiff, CommitDiff, DiffResult
//! - `health`: HealthResponse for liveness probes

pub mod diff;
pub mod health;

pub use diff::*;
pub use health::*;

//! Commit-set diffing.
//!
//! - `engine`: pure two-listing diff
//! - `batch`: concurrent fetch + diff over a batch of repositories

pub mod batch;
pub mod engine;

pub use batch::{BatchError, BatchOrchestrator, BatchPolicy, EntryOutcome};
pub use engine::diff_commits;

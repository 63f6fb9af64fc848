pub mod client;
pub mod error;

pub use client::{CommitFetcher, DEFAULT_API_URL, GithubFetcher};
pub use error::{FetchError, FetchErrorKind};

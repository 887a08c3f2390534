//! Model content fetching.
//!
//! This module provides:
//! - The fetcher contract shared by every transport (`ModelFetcher`)
//! - Filesystem repositories (`local`)
//! - HTTP repositories (`remote`)

pub mod local;
pub mod remote;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalModelFetcher;
pub use remote::RemoteModelFetcher;

/// Errors a fetcher can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Nothing stored at the location
    #[error("Model content not found at \"{0}\"")]
    NotFound(String),

    /// The transport failed for another reason
    #[error("Failed to fetch \"{location}\": {message}")]
    Transport { location: String, message: String },
}

/// Retrieves raw model content from a repository.
///
/// Paths are relative to the repository root and follow the path convention
/// in [`crate::model::dtmi`]. Implementations never retry.
#[async_trait]
pub trait ModelFetcher: Send + Sync {
    /// Fetch the content stored at `path`.
    async fn fetch(&self, path: &str) -> Result<String, FetchError>;

    /// Fully qualified location of `path`, for diagnostics.
    fn location(&self, path: &str) -> String;
}

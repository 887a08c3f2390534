//! High-level client API.
//!
//! Provides the main user-facing interface for resolving models from a
//! repository.

mod options;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::error::{ConfigError, Result, ResolverError};
use crate::fetch::{LocalModelFetcher, ModelFetcher, RemoteModelFetcher};
use crate::model::dtmi::dtmi_to_qualified_path;
use crate::model::resolver::{DependencyResolution, ModelResolver, ResolvedModels};

pub use options::{ClientOptions, RepositoryLocation};

/// Resolves models and their dependencies from one repository.
///
/// Each call owns its own resolution state, so one client can serve
/// concurrent calls.
pub struct ResolverClient {
    repository: RepositoryLocation,
    fetcher: Arc<dyn ModelFetcher>,
    options: ClientOptions,
}

impl ResolverClient {
    /// Create a client for the public models repository.
    pub fn new() -> std::result::Result<Self, ConfigError> {
        Self::with_repository(RepositoryLocation::default(), ClientOptions::default())
    }

    /// Create a client for `repository`, choosing the fetcher from its kind.
    pub fn with_repository(
        repository: RepositoryLocation,
        options: ClientOptions,
    ) -> std::result::Result<Self, ConfigError> {
        options.validate()?;

        let fetcher: Arc<dyn ModelFetcher> = match &repository {
            RepositoryLocation::Local(root) => Arc::new(LocalModelFetcher::new(root.clone())),
            RepositoryLocation::Remote(base) => {
                let client = Client::builder()
                    .timeout(Duration::from_secs(options.request_timeout_secs))
                    .build()?;
                Arc::new(RemoteModelFetcher::with_client(base.clone(), client))
            }
        };

        log::debug!("Client initialized for repository {}", repository);
        Ok(Self {
            repository,
            fetcher,
            options,
        })
    }

    /// Create a client for `repository` that fetches through `fetcher`.
    pub fn with_fetcher(
        repository: RepositoryLocation,
        fetcher: Arc<dyn ModelFetcher>,
        options: ClientOptions,
    ) -> std::result::Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            repository,
            fetcher,
            options,
        })
    }

    pub fn repository(&self) -> &RepositoryLocation {
        &self.repository
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Resolve one model with the client's default strategy.
    pub async fn resolve(&self, dtmi: &str) -> Result<ResolvedModels> {
        self.resolve_with(&[dtmi], self.options.dependency_resolution)
            .await
    }

    /// Resolve several models with the client's default strategy.
    pub async fn resolve_many<S: AsRef<str> + Sync>(&self, dtmis: &[S]) -> Result<ResolvedModels> {
        self.resolve_with(dtmis, self.options.dependency_resolution)
            .await
    }

    /// Resolve models with `resolution` for this call only.
    ///
    /// # Arguments
    /// * `dtmis` - Requested identifiers; repeats are resolved once
    /// * `resolution` - Strategy overriding the client default for this call
    pub async fn resolve_with<S: AsRef<str> + Sync>(
        &self,
        dtmis: &[S],
        resolution: DependencyResolution,
    ) -> Result<ResolvedModels> {
        let resolver = ModelResolver::new(self.fetcher.as_ref(), self.options.max_concurrent_fetches);

        match resolver.resolve(dtmis, resolution).await {
            Ok(models) => {
                log::debug!(
                    "Resolved {} models from {} with {} resolution",
                    models.len(),
                    self.repository,
                    resolution
                );
                Ok(models)
            }
            Err(e) => {
                log::warn!("{}", e);
                Err(e)
            }
        }
    }

    /// Fully qualified location of a model in this client's repository.
    pub fn model_location(&self, dtmi: &str, expanded: bool) -> Result<String> {
        dtmi_to_qualified_path(dtmi, &self.repository, expanded)
            .map_err(|e| ResolverError::new(dtmi, e))
    }
}

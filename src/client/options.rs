//! Client configuration.

use std::path::PathBuf;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;
use crate::fetch::remote::with_trailing_slash;
use crate::model::resolver::DependencyResolution;

/// Where a client reads models from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryLocation {
    /// Root directory of a repository on disk
    Local(PathBuf),
    /// Base URL of a repository served over HTTP
    Remote(Url),
}

impl RepositoryLocation {
    /// Parse a repository location.
    ///
    /// `http` and `https` URLs are remote, `file` URLs and anything that is not
    /// a URL are treated as filesystem paths.
    pub fn parse(location: &str) -> Result<Self, ConfigError> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidRepository(location.to_string()));
        }

        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                Ok(Self::Remote(with_trailing_slash(url)))
            }
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| ConfigError::InvalidRepository(location.to_string())),
            // Single letter schemes are Windows drive letters
            Ok(url) if url.scheme().len() > 1 => {
                Err(ConfigError::InvalidRepository(location.to_string()))
            }
            _ => Ok(Self::Local(PathBuf::from(trimmed))),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Join a relative repository path onto this location.
    pub fn qualify(&self, path: &str) -> String {
        match self {
            Self::Local(root) => path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .fold(root.clone(), |acc, segment| acc.join(segment))
                .to_string_lossy()
                .to_string(),
            Self::Remote(base) => base
                .join(path.trim_start_matches('/'))
                .map(|url| url.to_string())
                .unwrap_or_else(|_| format!("{}{}", base, path)),
        }
    }
}

impl Default for RepositoryLocation {
    fn default() -> Self {
        Self::parse(defaults::REPOSITORY)
            .unwrap_or_else(|_| Self::Local(PathBuf::from(defaults::REPOSITORY)))
    }
}

impl std::fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(root) => write!(f, "{}", root.display()),
            Self::Remote(base) => write!(f, "{}", base),
        }
    }
}

/// Options fixed for the lifetime of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Strategy used when a call does not override it
    #[serde(default = "defaults::dependency_resolution")]
    pub dependency_resolution: DependencyResolution,
    /// Upper bound on fetches in flight within one call
    #[serde(default = "defaults::max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Request timeout for clients that build their own HTTP transport
    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            dependency_resolution: defaults::dependency_resolution(),
            max_concurrent_fetches: defaults::MAX_CONCURRENT_FETCHES,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientOptions {
    /// Options with a different default strategy.
    pub fn with_dependency_resolution(mut self, resolution: DependencyResolution) -> Self {
        self.dependency_resolution = resolution;
        self
    }

    /// Parse options from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

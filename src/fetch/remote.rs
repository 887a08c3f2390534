//! HTTP-backed repositories.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::defaults;
use crate::fetch::{FetchError, ModelFetcher};

/// Reads models relative to a base URL.
#[derive(Debug, Clone)]
pub struct RemoteModelFetcher {
    client: Client,
    base: Url,
}

impl RemoteModelFetcher {
    /// Create a fetcher with the default request timeout.
    pub fn new(base: Url) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(base, client)
    }

    /// Create a fetcher that sends requests through `client`.
    ///
    /// Timeouts, proxies and authentication are whatever `client` was built with.
    pub fn with_client(base: Url, client: Client) -> Self {
        Self {
            client,
            base: with_trailing_slash(base),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::Transport {
                location: format!("{}{}", self.base, path),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ModelFetcher for RemoteModelFetcher {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url(path)?;
        log::debug!("Fetching model content from {}", url);

        let transport = |message: String| FetchError::Transport {
            location: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(transport(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport(e.to_string()))?;
        String::from_utf8(body.to_vec()).map_err(|e| transport(e.to_string()))
    }

    fn location(&self, path: &str) -> String {
        self.url(path)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.base, path))
    }
}

/// Ensure relative joins land beneath the base path instead of replacing its last segment.
pub(crate) fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

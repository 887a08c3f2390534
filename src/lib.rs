//! Models repository - resolve DTDL model identifiers and their dependencies.
//!
//! A repository stores one JSON document per model under a path derived from
//! the model's DTMI, either on disk or behind an HTTP endpoint.
//! [`ResolverClient`] fetches requested models and, depending on the
//! [`DependencyResolution`] strategy, every model they extend or embed as a
//! component.

mod defaults;
pub mod error;

pub mod client;
pub mod fetch;
pub mod model;

pub use error::{ConfigError, Error, ErrorKind, ResolverError, Result};

pub use client::{ClientOptions, RepositoryLocation, ResolverClient};
pub use fetch::{FetchError, LocalModelFetcher, ModelFetcher, RemoteModelFetcher};
pub use model::dtmi::{dtmi_to_path, dtmi_to_qualified_path, is_valid_dtmi};
pub use model::query::{ModelMetadata, ModelQuery};
pub use model::resolver::{DependencyResolution, ModelResolver, ResolvedModels};

pub use reqwest::Url;

/// Public models repository used by [`ResolverClient::new`].
pub const DEFAULT_REPOSITORY: &str = defaults::REPOSITORY;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

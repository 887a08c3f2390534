//! Error types for the models repository resolver.

use thiserror::Error;

use crate::fetch::FetchError;

/// Specific cause of a failed resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Identifier does not follow the DTMI grammar
    #[error("Invalid DTMI format \"{0}\".")]
    InvalidDtmi(String),

    /// No content at the derived repository path
    #[error("Model content not found at \"{0}\".")]
    NotFound(String),

    /// Content exists under a differently cased identifier
    #[error("Retrieved model content has incorrect DTMI casing. Expected \"{expected}\", parsed \"{parsed}\".")]
    IncorrectCasing { expected: String, parsed: String },

    /// Content exists but has no valid declared root
    #[error("Failed to parse model content from \"{path}\": {reason}")]
    Parse { path: String, reason: String },

    /// Fetch mechanism failed for reasons other than absence
    #[error("Failed to fetch model content from \"{path}\": {message}")]
    Transport { path: String, message: String },
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(location) => Error::NotFound(location),
            FetchError::Transport { location, message } => Error::Transport {
                path: location,
                message,
            },
        }
    }
}

/// Failure category, for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidFormat,
    NotFound,
    CasingMismatch,
    ParseError,
    TransportError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "INVALID_FORMAT"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::CasingMismatch => write!(f, "CASING_MISMATCH"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::TransportError => write!(f, "TRANSPORT_ERROR"),
        }
    }
}

impl Error {
    /// Category of this cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDtmi(_) => ErrorKind::InvalidFormat,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::IncorrectCasing { .. } => ErrorKind::CasingMismatch,
            Self::Parse { .. } => ErrorKind::ParseError,
            Self::Transport { .. } => ErrorKind::TransportError,
        }
    }
}

/// Error returned by every resolve operation.
///
/// Names the identifier that could not be resolved, which may be a transitive
/// dependency rather than one of the identifiers the caller asked for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to resolve \"{dtmi}\". {cause}")]
pub struct ResolverError {
    dtmi: String,
    #[source]
    cause: Error,
}

impl ResolverError {
    pub fn new(dtmi: impl Into<String>, cause: Error) -> Self {
        Self {
            dtmi: dtmi.into(),
            cause,
        }
    }

    /// The offending identifier.
    pub fn dtmi(&self) -> &str {
        &self.dtmi
    }

    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }

    /// The specific cause behind the generic prefix.
    pub fn inner(&self) -> &Error {
        &self.cause
    }
}

/// Invalid client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid repository location \"{0}\"")]
    InvalidRepository(String),

    #[error("max_concurrent_fetches must be at least 1")]
    ZeroConcurrency,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for resolve operations.
pub type Result<T> = std::result::Result<T, ResolverError>;

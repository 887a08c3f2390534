//! Dependency resolution engine.
//!
//! Resolves requested DTMIs into their model content plus the content of
//! every model they transitively depend on.
//!
//! Per identifier the engine moves through
//! QUEUED -> FETCHING -> PARSED -> RESOLVED, or FAILED, which ends the call.
//! An identifier is fetched at most once per call however many models
//! reference it.

use std::collections::{HashMap, HashSet, VecDeque};

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ResolverError};
use crate::fetch::{FetchError, ModelFetcher};
use crate::model::dtmi::{dtmi_to_path, validate};
use crate::model::query::ModelQuery;

/// How dependencies of requested models are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyResolution {
    /// Fetch each model and follow its dependencies
    #[default]
    Full,
    /// Fetch only the requested models
    Disabled,
    /// Try each requested model's pre-expanded document before falling back to `Full`
    TryExpandedFirst,
}

impl std::fmt::Display for DependencyResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "FULL"),
            Self::Disabled => write!(f, "DISABLED"),
            Self::TryExpandedFirst => write!(f, "TRY_EXPANDED_FIRST"),
        }
    }
}

/// Resolved model content keyed by DTMI.
pub type ResolvedModels = HashMap<String, String>;

/// One unit of queued work.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Job {
    /// Try the pre-expanded document of a requested model
    Expanded(String),
    /// Fetch the model document itself
    Model(String),
}

impl Job {
    fn dtmi(&self) -> &str {
        match self {
            Job::Expanded(dtmi) | Job::Model(dtmi) => dtmi,
        }
    }

    fn is_expanded(&self) -> bool {
        matches!(self, Job::Expanded(_))
    }
}

/// Outcome of one fetch, handed back to the aggregator.
struct Fetched {
    job: Job,
    location: String,
    result: Result<String, FetchError>,
}

/// State owned by a single resolve call.
///
/// Only the aggregator loop touches it, so marking an identifier visited and
/// deciding to fetch it happen in one step.
struct ResolutionContext {
    resolution: DependencyResolution,
    visited: HashSet<String>,
    queue: VecDeque<Job>,
    results: ResolvedModels,
}

impl ResolutionContext {
    fn new(resolution: DependencyResolution) -> Self {
        Self {
            resolution,
            visited: HashSet::new(),
            queue: VecDeque::new(),
            results: HashMap::new(),
        }
    }

    /// Queue a requested identifier, ignoring repeats.
    fn seed(&mut self, dtmi: &str) {
        if !self.visited.insert(dtmi.to_string()) {
            return;
        }
        let job = match self.resolution {
            DependencyResolution::TryExpandedFirst => Job::Expanded(dtmi.to_string()),
            DependencyResolution::Full | DependencyResolution::Disabled => {
                Job::Model(dtmi.to_string())
            }
        };
        self.queue.push_back(job);
    }

    fn is_resolved(&self, dtmi: &str) -> bool {
        self.results.contains_key(dtmi)
    }

    /// Fold one finished fetch into the context.
    fn complete(&mut self, fetched: Fetched) -> Result<(), ResolverError> {
        let Fetched {
            job,
            location,
            result,
        } = fetched;

        // Stored from an expanded document while this fetch was in flight
        if self.is_resolved(job.dtmi()) {
            log::debug!("Discarding fetch of {}, already resolved", job.dtmi());
            return Ok(());
        }

        match job {
            Job::Expanded(dtmi) => match result {
                Ok(content) => self.store_expanded(&dtmi, &content, &location),
                Err(FetchError::NotFound(_)) => {
                    log::debug!(
                        "No expanded model at {}, resolving {} from its model document",
                        location,
                        dtmi
                    );
                    self.queue.push_back(Job::Model(dtmi));
                    Ok(())
                }
                Err(e) => Err(ResolverError::new(dtmi, e.into())),
            },
            Job::Model(dtmi) => {
                let content = result.map_err(|e| ResolverError::new(dtmi.as_str(), e.into()))?;
                self.store_model(dtmi, content, &location)
            }
        }
    }

    fn store_model(
        &mut self,
        dtmi: String,
        content: String,
        location: &str,
    ) -> Result<(), ResolverError> {
        let query = ModelQuery::new(&content, location);

        let dependencies = if self.resolution == DependencyResolution::Disabled {
            let id = query.parse_id().map_err(|e| ResolverError::new(dtmi.as_str(), e))?;
            check_declared_id(&dtmi, &id, location)?;
            Vec::new()
        } else {
            let metadata = query
                .parse_model()
                .map_err(|e| ResolverError::new(dtmi.as_str(), e))?;
            check_declared_id(&dtmi, &metadata.id, location)?;
            metadata.dependencies()
        };

        if !dependencies.is_empty() {
            log::debug!("Discovered dependencies of {}: {}", dtmi, dependencies.join(", "));
        }

        for dependency in dependencies {
            validate(&dependency).map_err(|e| ResolverError::new(dependency.as_str(), e))?;
            if self.visited.insert(dependency.clone()) {
                self.queue.push_back(Job::Model(dependency));
            }
        }

        self.results.entry(dtmi).or_insert(content);
        Ok(())
    }

    fn store_expanded(
        &mut self,
        dtmi: &str,
        content: &str,
        location: &str,
    ) -> Result<(), ResolverError> {
        let entries = ModelQuery::new(content, location)
            .decompose_expanded()
            .map_err(|e| ResolverError::new(dtmi, e))?;

        if !entries.iter().any(|(id, _)| id == dtmi) {
            let cause = match entries.iter().find(|(id, _)| id.eq_ignore_ascii_case(dtmi)) {
                Some((parsed, _)) => Error::IncorrectCasing {
                    expected: dtmi.to_string(),
                    parsed: parsed.clone(),
                },
                None => Error::Parse {
                    path: location.to_string(),
                    reason: format!("expanded content does not contain \"{}\"", dtmi),
                },
            };
            return Err(ResolverError::new(dtmi, cause));
        }

        log::debug!(
            "Resolved {} from expanded content with {} models",
            dtmi,
            entries.len()
        );

        for (id, entry) in entries {
            self.visited.insert(id.clone());
            self.results.entry(id).or_insert(entry);
        }
        Ok(())
    }
}

/// The declared root must match the requested identifier exactly.
fn check_declared_id(requested: &str, declared: &str, location: &str) -> Result<(), ResolverError> {
    if declared == requested {
        return Ok(());
    }

    let cause = if declared.eq_ignore_ascii_case(requested) {
        Error::IncorrectCasing {
            expected: requested.to_string(),
            parsed: declared.to_string(),
        }
    } else {
        Error::Parse {
            path: location.to_string(),
            reason: format!("content declares \"{}\"", declared),
        }
    };
    Err(ResolverError::new(requested, cause))
}

/// Resolves models and their dependencies through a fetcher.
pub struct ModelResolver<'a> {
    fetcher: &'a dyn ModelFetcher,
    max_concurrent_fetches: usize,
}

impl<'a> ModelResolver<'a> {
    /// Create a resolver.
    ///
    /// `max_concurrent_fetches` is clamped to at least one.
    pub fn new(fetcher: &'a dyn ModelFetcher, max_concurrent_fetches: usize) -> Self {
        Self {
            fetcher,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    /// Resolve `dtmis` under `resolution`.
    ///
    /// All-or-nothing: the first failure drops every fetch still in flight and
    /// is the only error reported.
    pub async fn resolve<S: AsRef<str>>(
        &self,
        dtmis: &[S],
        resolution: DependencyResolution,
    ) -> Result<ResolvedModels, ResolverError> {
        for dtmi in dtmis {
            let dtmi = dtmi.as_ref();
            validate(dtmi).map_err(|e| ResolverError::new(dtmi, e))?;
        }

        let mut context = ResolutionContext::new(resolution);
        for dtmi in dtmis {
            context.seed(dtmi.as_ref());
        }

        let mut in_flight = FuturesUnordered::new();
        loop {
            while in_flight.len() < self.max_concurrent_fetches {
                let Some(job) = context.queue.pop_front() else {
                    break;
                };
                if context.is_resolved(job.dtmi()) {
                    continue;
                }
                in_flight.push(self.fetch(job));
            }

            let Some(fetched) = in_flight.next().await else {
                break;
            };

            if let Err(e) = fetched.and_then(|fetched| context.complete(fetched)) {
                log::debug!("Resolution failed, cancelling {} pending fetches", in_flight.len());
                return Err(e);
            }
        }

        Ok(context.results)
    }

    async fn fetch(&self, job: Job) -> Result<Fetched, ResolverError> {
        let path = dtmi_to_path(job.dtmi(), job.is_expanded())
            .map_err(|e| ResolverError::new(job.dtmi(), e))?;
        let location = self.fetcher.location(&path);

        log::debug!("Processing {} from {}", job.dtmi(), location);
        let result = self.fetcher.fetch(&path).await;

        Ok(Fetched {
            job,
            location,
            result,
        })
    }
}

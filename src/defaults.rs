//! Default values for client configuration.

use crate::model::resolver::DependencyResolution;

/// Public models repository used when no location is configured.
pub const REPOSITORY: &str = "https://devicemodels.azure.com";
pub const MAX_CONCURRENT_FETCHES: usize = 8;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

pub fn dependency_resolution() -> DependencyResolution { DependencyResolution::Full }
pub fn max_concurrent_fetches() -> usize { MAX_CONCURRENT_FETCHES }
pub fn request_timeout_secs() -> u64 { REQUEST_TIMEOUT_SECS }

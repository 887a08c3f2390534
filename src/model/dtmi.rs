//! DTMI grammar and repository path convention.
//!
//! A repository stores each model under a path derived from its identifier:
//! `dtmi:com:example:Thermostat;1` lives at `dtmi/com/example/thermostat-1.json`,
//! and its pre-expanded form (the model plus its whole dependency closure) at
//! `dtmi/com/example/thermostat-1.expanded.json`.

use std::sync::OnceLock;

use regex::Regex;

use crate::client::RepositoryLocation;
use crate::error::Error;

const DTMI_PATTERN: &str = "^dtmi:[A-Za-z](?:[A-Za-z0-9_]*[A-Za-z0-9])?(?::[A-Za-z](?:[A-Za-z0-9_]*[A-Za-z0-9])?)*;[1-9][0-9]{0,8}$";

const JSON_EXTENSION: &str = ".json";
const EXPANDED_JSON_EXTENSION: &str = ".expanded.json";

fn dtmi_regex() -> &'static Regex {
    static DTMI_REGEX: OnceLock<Regex> = OnceLock::new();
    DTMI_REGEX.get_or_init(|| Regex::new(DTMI_PATTERN).expect("DTMI pattern is a valid regex"))
}

/// Whether `dtmi` follows the DTMI grammar.
pub fn is_valid_dtmi(dtmi: &str) -> bool {
    dtmi_regex().is_match(dtmi)
}

/// Validate `dtmi`, naming it in the error when it is malformed.
pub fn validate(dtmi: &str) -> Result<(), Error> {
    if is_valid_dtmi(dtmi) {
        Ok(())
    } else {
        Err(Error::InvalidDtmi(dtmi.to_string()))
    }
}

/// Relative repository path of a model.
///
/// # Arguments
/// * `dtmi` - Identifier of the model; must be valid
/// * `expanded` - Point at the pre-expanded document instead of the model itself
pub fn dtmi_to_path(dtmi: &str, expanded: bool) -> Result<String, Error> {
    validate(dtmi)?;

    let mut path = dtmi.to_lowercase().replace(':', "/").replace(';', "-");
    path.push_str(if expanded {
        EXPANDED_JSON_EXTENSION
    } else {
        JSON_EXTENSION
    });
    Ok(path)
}

/// Fully qualified location of a model inside `repository`.
pub fn dtmi_to_qualified_path(
    dtmi: &str,
    repository: &RepositoryLocation,
    expanded: bool,
) -> Result<String, Error> {
    let path = dtmi_to_path(dtmi, expanded)?;
    Ok(repository.qualify(&path))
}

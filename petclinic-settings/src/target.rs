//! Picking the deployment under test.
//!
//! The base URL is resolved once per run, before any request is made. The
//! first non-blank candidate wins:
//!
//! 1. the `BASE_URL` environment variable, as set by CI;
//! 2. `target.base_url` from the settings (config files or
//!    `PETCLINIC_TARGET__BASE_URL`);
//! 3. `http://localhost:8080`.
//!
//! Resolution never fails and never checks that the URL is reachable. A bad
//! target shows up as a transport error on the first request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable that names the deployment under test.
pub const BASE_URL_ENV: &str = "BASE_URL";

/// Used when nothing else names a target.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Settings that describe the deployment under test.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TargetSettings {
    /// Base URL of the API gateway. Overridden by the `BASE_URL` environment
    /// variable when that is set and not blank.
    pub base_url: Option<String>,
}

impl TargetSettings {
    /// Resolve the base URL, consulting the process environment first.
    pub fn resolve(&self) -> ResolvedBaseUrl {
        let from_env = std::env::var(BASE_URL_ENV).ok();
        resolve_base_url(from_env.as_deref(), self.base_url.as_deref())
    }
}

/// Where a resolved base URL came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseUrlSource {
    /// The `BASE_URL` environment variable.
    Environment,
    /// `target.base_url` in the settings.
    Settings,
    /// [`DEFAULT_BASE_URL`].
    Default,
}

/// The outcome of base URL resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedBaseUrl {
    /// The accepted value, exactly as it was provided.
    pub url: String,
    /// Which precedence level provided it.
    pub source: BaseUrlSource,
}

impl fmt::Display for ResolvedBaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Apply the precedence rules to the given candidates.
///
/// A candidate is only accepted if it is present and contains something other
/// than whitespace.
pub fn resolve_base_url(env_value: Option<&str>, setting_value: Option<&str>) -> ResolvedBaseUrl {
    if let Some(url) = accepted(env_value) {
        ResolvedBaseUrl {
            url: url.to_string(),
            source: BaseUrlSource::Environment,
        }
    } else if let Some(url) = accepted(setting_value) {
        ResolvedBaseUrl {
            url: url.to_string(),
            source: BaseUrlSource::Settings,
        }
    } else {
        ResolvedBaseUrl {
            url: DEFAULT_BASE_URL.to_string(),
            source: BaseUrlSource::Default,
        }
    }
}

/// A candidate that is present and not blank.
fn accepted(candidate: Option<&str>) -> Option<&str> {
    candidate.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{resolve_base_url, BaseUrlSource, DEFAULT_BASE_URL};
    use parameterized::parameterized;

    #[parameterized(
        env = {
            Some("http://ci:9000"),
            Some("http://ci:9000"),
            None,
            Some(""),
            Some("   "),
            None,
            Some("\t"),
        },
        setting = {
            Some("http://staging:8080"),
            None,
            Some("http://staging:8080"),
            Some("http://staging:8080"),
            Some("http://staging:8080"),
            None,
            Some(" "),
        },
        expected = {
            ("http://ci:9000", BaseUrlSource::Environment),
            ("http://ci:9000", BaseUrlSource::Environment),
            ("http://staging:8080", BaseUrlSource::Settings),
            ("http://staging:8080", BaseUrlSource::Settings),
            ("http://staging:8080", BaseUrlSource::Settings),
            (DEFAULT_BASE_URL, BaseUrlSource::Default),
            (DEFAULT_BASE_URL, BaseUrlSource::Default),
        },
    )]
    fn first_non_blank_candidate_wins(
        env: Option<&str>,
        setting: Option<&str>,
        expected: (&str, BaseUrlSource),
    ) {
        let resolved = resolve_base_url(env, setting);
        assert_eq!((resolved.url.as_str(), resolved.source), expected);
    }

    #[test]
    fn accepted_value_is_not_trimmed() {
        let resolved = resolve_base_url(Some(" http://ci:9000/ "), None);
        assert_eq!(resolved.url, " http://ci:9000/ ");
        assert_eq!(resolved.source, BaseUrlSource::Environment);
    }

    #[test]
    fn resolved_url_displays_as_the_url() {
        let resolved = resolve_base_url(None, None);
        assert_eq!(resolved.to_string(), "http://localhost:8080");
    }
}

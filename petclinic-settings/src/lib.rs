#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! # Petclinic contract test settings
//!
//! Configuration is specified in several ways, with later methods overriding earlier ones.
//!
//! 1. A base configuration checked into the repository, in `config/base.yaml`.
//!    This provides the default values for most settings.
//! 2. Per-environment configuration files in the `config` directory. The
//!    environment is selected using the environment variable `PETCLINIC_ENV`.
//!    The settings for that environment are then loaded from
//!    `config/${env}.yaml`, if it exists. The default environment is
//!    "development".
//! 3. A local configuration file not checked into the repository, at
//!    `config/local.yaml`.
//! 4. Environment variables that begin with `PETCLINIC_` and use `__` as a
//!    level separator. For example, `Settings::target::base_url` can be
//!    controlled from the environment variable `PETCLINIC_TARGET__BASE_URL`.
//!
//! The deployment under test is picked by [`TargetSettings::resolve`], which
//! gives the plain `BASE_URL` environment variable precedence over anything
//! loaded here. See the [`target`] module.
//!
//! Tests of the harness itself should use `Settings::load_for_tests`, which
//! only reads from `config/base.yaml`, `config/test.yaml`, and
//! `config/local_test.yaml` (if it exists). It does not read from environment
//! variables.

mod logging;
pub mod target;

pub use logging::{DirectiveWrapper, LogFormat, LoggingSettings};
pub use target::{resolve_base_url, BaseUrlSource, ResolvedBaseUrl, TargetSettings};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::time::Duration;

/// Directory holding the YAML configuration files, at the workspace root.
const CONFIG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config");

/// Top level settings object for the contract tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[doc(inline)]
pub struct Settings {
    /// The environment the tests are configured for. Should only be set with
    /// the `PETCLINIC_ENV` environment variable.
    pub env: String,

    /// Which deployment to test.
    pub target: TargetSettings,

    /// Settings for the HTTP client used by every request profile.
    pub http: HttpSettings,

    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Settings for the underlying HTTP client.
///
/// These are the client's own limits, meant to catch hung calls. They are much
/// looser than the latency ceiling scenarios assert on.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Total time allowed for a single request, in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,

    /// Time allowed to establish a connection, in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub connect_timeout: Duration,
}

impl Settings {
    /// Load settings from configuration files and environment variables.
    ///
    /// `RUST_LOG`, if set, is appended to the configured log levels.
    ///
    /// # Errors
    /// If any of the configured values are invalid, or if any of the required
    /// configuration files are missing.
    pub fn load() -> Result<Self, ConfigError> {
        let petclinic_env =
            std::env::var("PETCLINIC_ENV").unwrap_or_else(|_| "development".to_string());

        let mut settings = Self::load_layers(&petclinic_env, Self::environment())?;
        settings
            .logging
            .apply_rust_log(std::env::var("RUST_LOG").ok().as_deref())
            .map_err(|error| ConfigError::Message(format!("{:#}", error)))?;
        Ok(settings)
    }

    /// The environment variable layer. `PETCLINIC_TARGET__BASE_URL` maps to
    /// `Settings::target::base_url`.
    fn environment() -> Environment {
        Environment::with_prefix("PETCLINIC")
            .prefix_separator("_")
            .separator("__")
    }

    /// Merge the file layers for `petclinic_env`, then `environment` on top.
    fn load_layers(petclinic_env: &str, environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            // Start off with the base config.
            .add_source(File::with_name(&format!("{}/base", CONFIG_DIR)))
            .set_override("env", petclinic_env)?
            // Merge in an environment specific config.
            .add_source(
                File::with_name(&format!("{}/{}", CONFIG_DIR, petclinic_env)).required(false),
            )
            // Add a local configuration file that is `.gitignore`ed.
            .add_source(File::with_name(&format!("{}/local", CONFIG_DIR)).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Load settings from configuration files for tests, then let `changer`
    /// adjust them. Neither `PETCLINIC_*` variables nor `RUST_LOG` are read.
    ///
    /// # Panics
    /// If the test configuration files cannot be read or are invalid.
    pub fn load_for_tests<F: FnOnce(&mut Self)>(changer: F) -> Self {
        let config = Config::builder()
            .add_source(File::with_name(&format!("{}/base", CONFIG_DIR)))
            .set_override("env", "test")
            .expect("Could not set env for tests")
            .add_source(File::with_name(&format!("{}/test", CONFIG_DIR)))
            .add_source(File::with_name(&format!("{}/local_test", CONFIG_DIR)).required(false))
            .build()
            .expect("Could not load settings for tests");

        let mut settings: Self = config
            .try_deserialize()
            .expect("Could not convert settings");
        changer(&mut settings);
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use config::{Environment, Map};
    use std::time::Duration;

    /// An environment layer fed from `vars` instead of the process.
    fn fake_environment(vars: &[(&str, &str)]) -> Environment {
        let source: Map<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Settings::environment().source(Some(source))
    }

    #[test]
    fn test_settings_load() {
        let settings = Settings::load_for_tests(|_| ());
        assert_eq!(settings.env, "test");
        assert!(settings.target.base_url.is_none());
        assert_eq!(settings.http.timeout, Duration::from_secs(30));
    }

    #[test]
    fn changer_is_applied_last() {
        let settings = Settings::load_for_tests(|settings| {
            settings.target.base_url = Some("http://staging:8080".to_string());
        });
        assert_eq!(
            settings.target.base_url.as_deref(),
            Some("http://staging:8080")
        );
    }

    #[test]
    fn test_settings_levels_come_from_files_only() {
        let settings = Settings::load_for_tests(|_| ());
        assert_eq!(settings.logging.levels.directives(), &["INFO", "hyper=WARN"]);
    }

    #[test]
    fn environment_variable_overrides_configured_base_url() {
        let settings = Settings::load_layers(
            "test",
            fake_environment(&[("PETCLINIC_TARGET__BASE_URL", "http://staging:8080")]),
        )
        .expect("settings load");
        assert_eq!(settings.env, "test");
        assert_eq!(
            settings.target.base_url.as_deref(),
            Some("http://staging:8080")
        );
    }

    #[test]
    fn environment_variable_overrides_nested_http_settings() {
        let settings = Settings::load_layers(
            "test",
            fake_environment(&[("PETCLINIC_HTTP__TIMEOUT", "5")]),
        )
        .expect("settings load");
        assert_eq!(settings.http.timeout, Duration::from_secs(5));
        assert_eq!(settings.http.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn unrelated_variables_are_ignored() {
        let settings = Settings::load_layers(
            "test",
            fake_environment(&[("BASE_URL", "http://ci:9000"), ("OTHER_TARGET__BASE_URL", "x")]),
        )
        .expect("settings load");
        assert!(settings.target.base_url.is_none());
    }
}

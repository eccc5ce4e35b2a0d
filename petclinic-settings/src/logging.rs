use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, str::FromStr};
use tracing_subscriber::{filter::Directive, EnvFilter};

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directives for scenario logs.
    ///
    /// Each entry is a level (`ERROR` through `TRACE`), optionally scoped to a
    /// target. The request and response dumps are logged at `INFO` by
    /// `petclinic_api_tests`.
    ///
    /// ```yaml
    /// # config/local.yaml
    /// logging:
    ///   levels:
    ///     - INFO
    ///     - petclinic_api_tests=DEBUG
    ///     - hyper=WARN
    /// ```
    ///
    /// `RUST_LOG` is appended on top when running against a deployment, see
    /// [`LoggingSettings::apply_rust_log`]. It is never consulted by the
    /// harness self-tests.
    pub levels: DirectiveWrapper,

    /// How scenario logs are printed to the test output.
    pub format: LogFormat,
}

impl LoggingSettings {
    /// Append the directives in `rust_log`, if any, so they take precedence
    /// over the configured ones. Blank values are ignored.
    ///
    /// # Errors
    /// If `rust_log` holds an invalid directive.
    pub fn apply_rust_log(&mut self, rust_log: Option<&str>) -> anyhow::Result<()> {
        if let Some(rust_log) = rust_log.filter(|value| !value.trim().is_empty()) {
            let extra: DirectiveWrapper = rust_log.parse().context("parsing RUST_LOG")?;
            self.levels.0.extend(extra.0);
        }
        Ok(())
    }
}

/// Console formats for scenario logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented.
    Pretty,

    /// Newline delimited JSON, one object per event. For CI archives.
    Json,

    /// One line per event.
    Compact,
}

/// A validated list of filter directives.
///
/// Config files give a list, environment variables give one comma separated
/// string. Both are accepted, and list entries may themselves hold several
/// comma separated directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDirectives", into = "Vec<String>")]
pub struct DirectiveWrapper(Vec<String>);

/// The shapes `levels` can take before validation.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDirectives {
    /// `"INFO,hyper=WARN"`
    One(String),
    /// `["INFO", "hyper=WARN"]`
    Many(Vec<String>),
}

impl DirectiveWrapper {
    /// The directives, in the order they are applied.
    pub fn directives(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<RawDirectives> for DirectiveWrapper {
    type Error = anyhow::Error;

    fn try_from(raw: RawDirectives) -> Result<Self, Self::Error> {
        match raw {
            RawDirectives::One(joined) => joined.parse(),
            RawDirectives::Many(entries) => {
                let mut directives = Vec::with_capacity(entries.len());
                for entry in entries {
                    directives.extend(entry.parse::<Self>()?.0);
                }
                Ok(Self(directives))
            }
        }
    }
}

impl From<DirectiveWrapper> for Vec<String> {
    fn from(wrapper: DirectiveWrapper) -> Self {
        wrapper.0
    }
}

impl FromStr for DirectiveWrapper {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ToString::to_string)
            .collect();

        for part in &parts {
            part.parse::<Directive>()
                .with_context(|| format!("invalid log directive `{}`", part))?;
            // Crate names are written with underscores in targets.
            if part.contains('-') {
                bail!("log target in `{}` must not include hyphens", part);
            }
        }

        Ok(Self(parts))
    }
}

impl From<&DirectiveWrapper> for EnvFilter {
    fn from(val: &DirectiveWrapper) -> Self {
        val.0
            .iter()
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(EnvFilter::default(), EnvFilter::add_directive)
    }
}

#[cfg(test)]
mod tests {
    use super::{DirectiveWrapper, LogFormat, LoggingSettings};

    fn settings(levels: &str) -> LoggingSettings {
        LoggingSettings {
            levels: levels.parse().expect("valid directives"),
            format: LogFormat::Compact,
        }
    }

    #[test]
    fn parses_comma_separated_directives() {
        let parsed: DirectiveWrapper = "INFO, petclinic_api_tests=DEBUG,".parse().unwrap();
        assert_eq!(
            parsed.directives(),
            &["INFO".to_string(), "petclinic_api_tests=DEBUG".to_string()]
        );
    }

    #[test]
    fn rejects_hyphenated_targets() {
        let parsed: Result<DirectiveWrapper, _> = "petclinic-api-tests=DEBUG".parse();
        assert!(parsed.is_err());
    }

    #[test]
    fn deserializes_from_a_sequence_exactly() {
        let parsed: DirectiveWrapper =
            serde_json::from_value(serde_json::json!(["WARN", "reqwest=INFO,hyper=ERROR"]))
                .unwrap();
        assert_eq!(parsed.directives(), &["WARN", "reqwest=INFO", "hyper=ERROR"]);
    }

    #[test]
    fn deserializes_from_a_string() {
        let parsed: DirectiveWrapper =
            serde_json::from_value(serde_json::json!("INFO,hyper=WARN")).unwrap();
        assert_eq!(parsed.directives(), &["INFO", "hyper=WARN"]);
    }

    #[test]
    fn invalid_entries_fail_deserialization() {
        let parsed: Result<DirectiveWrapper, _> =
            serde_json::from_value(serde_json::json!(["INFO", "hyper=LOUD"]));
        assert!(parsed.is_err());
    }

    #[test]
    fn serializes_as_a_list() {
        let wrapper: DirectiveWrapper = "INFO,hyper=WARN".parse().unwrap();
        assert_eq!(
            serde_json::to_value(&wrapper).unwrap(),
            serde_json::json!(["INFO", "hyper=WARN"])
        );
    }

    #[test]
    fn rust_log_is_appended_after_configured_levels() {
        let mut logging = settings("INFO");
        logging.apply_rust_log(Some("warn")).unwrap();
        assert_eq!(logging.levels.directives(), &["INFO", "warn"]);
    }

    #[test]
    fn missing_or_blank_rust_log_changes_nothing() {
        let mut logging = settings("INFO");
        logging.apply_rust_log(None).unwrap();
        logging.apply_rust_log(Some("  ")).unwrap();
        assert_eq!(logging.levels.directives(), &["INFO"]);
    }

    #[test]
    fn invalid_rust_log_is_an_error() {
        let mut logging = settings("INFO");
        assert!(logging.apply_rust_log(Some("my-crate=debug")).is_err());
        assert_eq!(logging.levels.directives(), &["INFO"]);
    }

    #[test]
    fn log_format_is_lowercase() {
        let format: LogFormat = serde_json::from_value(serde_json::json!("compact")).unwrap();
        assert_eq!(format, LogFormat::Compact);
    }
}

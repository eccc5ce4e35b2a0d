//! Tools for running scenarios

use crate::utils::{logging::LogCapture, profiles::Profiles};
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use petclinic_settings::{LogFormat, ResolvedBaseUrl, Settings};
use std::{future::Future, sync::Arc};
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

lazy_static! {
    /// The harness for the live deployment, built on first use and shared by
    /// every scenario in the run.
    static ref LIVE_HARNESS: Arc<Harness> = Arc::new(
        Harness::from_environment().expect("Could not set up the contract test harness")
    );
}

/// Everything a run needs, resolved once: settings, the target, and the two
/// request profiles.
#[derive(Debug)]
pub struct Harness {
    /// Loaded settings.
    settings: Settings,
    /// The deployment under test.
    target: ResolvedBaseUrl,
    /// The shared read and write profiles.
    profiles: Arc<Profiles>,
}

impl Harness {
    /// Build a harness from settings, resolving the target from them and the
    /// `BASE_URL` environment variable.
    ///
    /// # Errors
    /// If the HTTP client cannot be built.
    pub fn new(settings: Settings) -> Result<Self> {
        let target = settings.target.resolve();
        Self::with_target(settings, target)
    }

    /// Build a harness for the deployment named by the environment and the
    /// full settings stack.
    ///
    /// # Errors
    /// If settings cannot be loaded or the HTTP client cannot be built.
    pub fn from_environment() -> Result<Self> {
        let settings = Settings::load().context("Loading settings")?;
        Self::new(settings)
    }

    /// Build a harness for an explicit target, skipping resolution.
    ///
    /// # Errors
    /// If the HTTP client cannot be built.
    pub fn with_target(settings: Settings, target: ResolvedBaseUrl) -> Result<Self> {
        let profiles = Profiles::new(&target.url, &settings.http)
            .with_context(|| format!("Building request profiles for {}", target))?;
        Ok(Self {
            settings,
            target,
            profiles: Arc::new(profiles),
        })
    }

    /// The loaded settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The deployment under test.
    pub fn target(&self) -> &ResolvedBaseUrl {
        &self.target
    }

    /// The shared profiles.
    pub fn profiles(&self) -> Arc<Profiles> {
        Arc::clone(&self.profiles)
    }
}

/// Run a scenario against the live deployment.
///
/// The harness is built the first time any scenario runs and reused after
/// that. The scenario gets a [`TestingTools`] with the shared profiles and a
/// log collector scoped to this scenario.
///
/// # Example
///
/// ```ignore
/// # use petclinic_api_tests::{contract_test, TestingTools};
/// #[tokio::test]
/// async fn a_scenario() -> anyhow::Result<()> {
///     contract_test("a_scenario", |TestingTools { profiles, .. }| async move {
///         profiles.read.get("/api/vet/vets").send().await?;
///         Ok(())
///     })
///     .await
/// }
/// ```
///
/// # Panics
/// If the harness cannot be set up, for example because the configuration
/// files are invalid.
pub async fn contract_test<FTest, Fut>(scenario: &'static str, test: FTest) -> Fut::Output
where
    FTest: FnOnce(TestingTools) -> Fut,
    Fut: Future,
{
    run_scenario(None, scenario, test).await
}

/// Run a scenario against `base_url` instead of the live deployment, with
/// test settings. This is how the harness tests itself against mock servers.
///
/// # Panics
/// If the test settings cannot be loaded or the client cannot be built.
pub async fn contract_test_against<FTest, Fut>(
    base_url: impl Into<String>,
    scenario: &'static str,
    test: FTest,
) -> Fut::Output
where
    FTest: FnOnce(TestingTools) -> Fut,
    Fut: Future,
{
    let settings = Settings::load_for_tests(|_| ());
    let target = ResolvedBaseUrl {
        url: base_url.into(),
        source: petclinic_settings::BaseUrlSource::Settings,
    };
    let harness = Harness::with_target(settings, target).expect("Could not build test harness");
    run_scenario(Some(Arc::new(harness)), scenario, test).await
}

/// Install a per-scenario subscriber, then run `test` inside a span.
///
/// When `harness` is `None` the shared live harness is used.
async fn run_scenario<FTest, Fut>(
    harness: Option<Arc<Harness>>,
    scenario: &'static str,
    test: FTest,
) -> Fut::Output
where
    FTest: FnOnce(TestingTools) -> Fut,
    Fut: Future,
{
    let logging = match &harness {
        Some(harness) => harness.settings().logging.clone(),
        None => LIVE_HARNESS.settings().logging.clone(),
    };

    let logs = LogCapture::default();

    let env_filter: EnvFilter = (&logging.levels).into();
    let console = logging.format;
    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(logs.writer()),
        )
        .with((console == LogFormat::Pretty).then(|| {
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_test_writer()
        }))
        .with((console == LogFormat::Compact).then(|| {
            tracing_subscriber::fmt::layer()
                .compact()
                .with_test_writer()
        }))
        .with((console == LogFormat::Json).then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_test_writer()
        }));

    let _subscriber_guard = tracing::subscriber::set_default(subscriber);

    let harness = harness.unwrap_or_else(|| Arc::clone(&LIVE_HARNESS));
    let span = tracing::info_span!(
        "scenario",
        scenario,
        base_url = %harness.target(),
    );
    span.in_scope(|| {
        tracing::debug!(source = ?harness.target().source, "starting scenario");
    });

    let tools = TestingTools {
        profiles: harness.profiles(),
        target: harness.target().clone(),
        logs,
    };

    test(tools).instrument(span).await
}

/// A set of tools for scenarios: the shared request profiles, the target they
/// point at, and a log collector.
///
/// The fields of this struct are marked as non-exhaustive, meaning that any
/// destructuring of this struct will require a `..` "and the rest" entry, even
/// if all present items are named. This makes adding tools in the future easier,
/// since old tests won't need to be rewritten to account for the added tools.
#[non_exhaustive]
pub struct TestingTools {
    /// The read and write profiles, shared with every other scenario.
    pub profiles: Arc<Profiles>,

    /// The deployment the profiles point at, and where that came from.
    pub target: ResolvedBaseUrl,

    /// Everything this scenario logged, including the request and response
    /// dumps written by the logging filters.
    pub logs: LogCapture,
}

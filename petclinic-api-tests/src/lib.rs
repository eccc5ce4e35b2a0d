#![warn(missing_docs, clippy::missing_docs_in_private_items)]
// None of the tests are seen by the linter, so none of the utilities are marked
// as used. But docs don't generate for the below if they are `#[cfg(test)]`.
// This is a compromise.
#![allow(dead_code)]

//! Contract tests for the petclinic API, run against a live deployment
//! through its HTTP surface only.
//!
//! The service is a black box. Nothing here mocks, stubs or inspects its
//! internals, and nothing assumes an empty dataset: records created by
//! earlier runs stay behind, so list checks are about shape, never counts.
//!
//! This is structured as a single crate so that every suite ends up in one
//! test binary. Suites are grouped so failures triage fast to slow:
//!
//! - `smoke`: one cheap reachability probe per top level resource.
//! - `owners`, `vets`, `pets`, `visits`: create, list, read and update
//!   checks per resource.
//! - `errors`: the negative paths, grouped by resource.
//!
//! Each scenario is arrange, act, assert. Arrange may create fixtures through
//! the write profile. Act makes exactly one call under test. Assert checks
//! status, body shape and latency of that one call, and the first unmet check
//! fails the scenario. Scenarios never depend on one another and are safe to
//! run in parallel.
//!
//! The target is chosen once per run: `BASE_URL` from the environment, then
//! `target.base_url` from the settings, then `http://localhost:8080`.
//! Scenarios only run with the `live-service` feature, since they need a
//! deployment to talk to:
//!
//! ```shell
//! BASE_URL=http://staging:8080 cargo test --features live-service
//! ```
//!
//! The primary tool used by scenarios is [`contract_test_macro`], which runs
//! an async scenario and hands it a [`TestingTools`].
//!
//! ```ignore
//! use petclinic_api_tests::{contract_test_macro, endpoints, TestingTools};
//! use reqwest::StatusCode;
//!
//! #[contract_test_macro]
//! async fn vets_are_listed(TestingTools { profiles, .. }: TestingTools) -> anyhow::Result<()> {
//!     profiles
//!         .read
//!         .get(endpoints::VETS)
//!         .send()
//!         .await?
//!         .assert_status(StatusCode::OK)?
//!         .assert_within_ceiling()?;
//!     Ok(())
//! }
//! ```

pub mod endpoints;
pub mod fixtures;
pub mod model;
mod utils;

mod errors;
mod harness;
mod owners;
mod pets;
mod smoke;
mod vets;
mod visits;

pub use crate::utils::{
    assertions::MAX_RESPONSE_TIME,
    errors::{ContractViolation, HarnessError, ViolationKind},
    filters::{
        ExchangeFilter, FilterChain, RequestLoggingFilter, ResponseLoggingFilter, REQUEST_SENT,
        RESPONSE_RECEIVED,
    },
    logging::{CaptureWriter, LogCapture, LoggedEvent},
    profiles::{
        CapturedRequest, CapturedResponse, Exchange, ProfileKind, Profiles, RequestProfile,
        ScenarioRequest,
    },
    schema,
    test_tools::{contract_test, contract_test_against, Harness, TestingTools},
};

pub use petclinic_api_tests_macro::contract_test as contract_test_macro;

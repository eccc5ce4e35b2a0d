//! Errors the harness can produce.
//!
//! There are two kinds. [`HarnessError`] means no usable response was
//! obtained at all. [`ContractViolation`] means a response arrived but did not
//! match what the scenario expected. A 400, 404 or 405 from the service is
//! neither: it is an ordinary [`Exchange`](crate::Exchange) that a scenario
//! can assert on.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// A failure to obtain a response from the service under test.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The request could not be sent or its response could not be read. An
    /// unreachable or malformed base URL ends up here.
    #[error("transport failure for {method} {url}")]
    Transport {
        /// The method of the failed request.
        method: reqwest::Method,
        /// The URL the request was addressed to.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// A request path did not start with `/`.
    #[error("request path `{path}` must start with '/'")]
    RelativePath {
        /// The path as given.
        path: String,
    },

    /// A request body could not be serialized.
    #[error("could not encode request body")]
    Encode(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("could not build HTTP client")]
    Client(#[source] reqwest::Error),
}

/// A response that did not satisfy an assertion.
///
/// The rendered exchange is part of the message, so a failing scenario always
/// reports the request it made and the response it got.
#[derive(Debug, Error)]
#[error("{kind}\n\n{exchange}")]
pub struct ContractViolation {
    /// What was wrong.
    pub kind: ViolationKind,
    /// The full request and response, rendered for humans.
    pub exchange: String,
}

/// The assertion family that failed.
#[derive(Debug, Error)]
pub enum ViolationKind {
    /// The status code was not the expected one.
    #[error("expected status {expected}, got {actual}")]
    Status {
        /// The status the scenario asserted.
        expected: StatusCode,
        /// The status the service returned.
        actual: StatusCode,
    },

    /// The call took too long.
    #[error("expected a response within {limit:?}, took {elapsed:?}")]
    Timing {
        /// The ceiling asserted.
        limit: Duration,
        /// The measured duration of the call.
        elapsed: Duration,
    },

    /// The body was missing, malformed, or had an unexpected value.
    #[error("unexpected body: {0}")]
    Body(String),

    /// A list response broke its resource schema.
    #[error("schema violation: {0}")]
    Schema(#[from] crate::utils::schema::SchemaMismatch),
}

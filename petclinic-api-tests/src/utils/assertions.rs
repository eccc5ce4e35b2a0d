//! Checks a scenario runs against the single exchange it made.
//!
//! Three families compose freely: status, body shape, and timing. Every check
//! returns the exchange again so they chain with `?`:
//!
//! ```ignore
//! profiles
//!     .read
//!     .get(endpoints::VETS)
//!     .send()
//!     .await?
//!     .assert_status(StatusCode::OK)?
//!     .assert_every_element(&schema::VET)?
//!     .assert_within_ceiling()?;
//! ```

use crate::utils::{
    errors::{ContractViolation, ViolationKind},
    profiles::Exchange,
    schema::{check_collection, ResourceSchema},
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Latency ceiling for any single call under test. A sanity bound, not a
/// benchmark.
pub const MAX_RESPONSE_TIME: Duration = Duration::from_millis(2000);

impl Exchange {
    /// Build a violation that carries this exchange.
    pub fn violation(&self, kind: ViolationKind) -> ContractViolation {
        ContractViolation {
            kind,
            exchange: self.to_string(),
        }
    }

    /// Shorthand for a [`ViolationKind::Body`] violation.
    fn body_violation(&self, message: impl Into<String>) -> ContractViolation {
        self.violation(ViolationKind::Body(message.into()))
    }

    /// The status must be exactly `expected`.
    ///
    /// # Errors
    /// On any other status.
    pub fn assert_status(&self, expected: StatusCode) -> Result<&Self, ContractViolation> {
        if self.response.status == expected {
            Ok(self)
        } else {
            Err(self.violation(ViolationKind::Status {
                expected,
                actual: self.response.status,
            }))
        }
    }

    /// The call must have completed in under `limit`.
    ///
    /// # Errors
    /// If it took `limit` or longer.
    pub fn assert_faster_than(&self, limit: Duration) -> Result<&Self, ContractViolation> {
        if self.elapsed < limit {
            Ok(self)
        } else {
            Err(self.violation(ViolationKind::Timing {
                limit,
                elapsed: self.elapsed,
            }))
        }
    }

    /// The call must have completed in under [`MAX_RESPONSE_TIME`].
    ///
    /// # Errors
    /// If it did not.
    pub fn assert_within_ceiling(&self) -> Result<&Self, ContractViolation> {
        self.assert_faster_than(MAX_RESPONSE_TIME)
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    /// If the body is empty or not JSON.
    pub fn json(&self) -> Result<Value, ContractViolation> {
        if self.response.body.is_empty() {
            return Err(self.body_violation("expected a JSON body, got none"));
        }
        serde_json::from_slice(&self.response.body)
            .map_err(|error| self.body_violation(format!("body is not JSON: {}", error)))
    }

    /// Decode the body into `T`, naming the offending path on failure.
    ///
    /// # Errors
    /// If the body does not have the shape of `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ContractViolation> {
        let deserializer = &mut serde_json::Deserializer::from_slice(&self.response.body);
        serde_path_to_error::deserialize(deserializer).map_err(|error| {
            self.body_violation(format!(
                "could not decode {} at `{}`: {}",
                std::any::type_name::<T>(),
                error.path(),
                error.inner()
            ))
        })
    }

    /// The body must be JSON and not `null`.
    ///
    /// # Errors
    /// Otherwise.
    pub fn assert_body_present(&self) -> Result<&Self, ContractViolation> {
        if self.json()?.is_null() {
            return Err(self.body_violation("body is null"));
        }
        Ok(self)
    }

    /// The body must be empty, as for a 204.
    ///
    /// # Errors
    /// If any bytes came back.
    pub fn assert_empty_body(&self) -> Result<&Self, ContractViolation> {
        if self.response.body.is_empty() {
            Ok(self)
        } else {
            Err(self.body_violation(format!(
                "expected no body, got {} bytes",
                self.response.body.len()
            )))
        }
    }

    /// The top level field `key` must be present and not null.
    ///
    /// # Errors
    /// If it is absent or null.
    pub fn assert_field_present(&self, key: &str) -> Result<&Self, ContractViolation> {
        match self.json()?.get(key) {
            Some(value) if !value.is_null() => Ok(self),
            Some(_) => Err(self.body_violation(format!("`{}` is null", key))),
            None => Err(self.body_violation(format!("`{}` is missing", key))),
        }
    }

    /// The top level field `key` must equal `expected`.
    ///
    /// # Errors
    /// If it is absent or different.
    pub fn assert_field_eq(
        &self,
        key: &str,
        expected: impl Into<Value>,
    ) -> Result<&Self, ContractViolation> {
        let expected = expected.into();
        let body = self.json()?;
        match body.get(key) {
            Some(actual) if *actual == expected => Ok(self),
            Some(actual) => Err(self.body_violation(format!(
                "expected `{}` to be {}, got {}",
                key, expected, actual
            ))),
            None => Err(self.body_violation(format!(
                "expected `{}` to be {}, but it is missing",
                key, expected
            ))),
        }
    }

    /// The top level field `key` must be a positive integer, which is returned.
    ///
    /// # Errors
    /// If it is absent, not an integer, or not positive.
    pub fn positive_id(&self, key: &str) -> Result<i64, ContractViolation> {
        match self.json()?.get(key).and_then(Value::as_i64) {
            Some(id) if id > 0 => Ok(id),
            Some(id) => Err(self.body_violation(format!("`{}` is {}, not positive", key, id))),
            None => Err(self.body_violation(format!("`{}` is not an integer", key))),
        }
    }

    /// The body must be a JSON array, of any length.
    ///
    /// # Errors
    /// Otherwise.
    pub fn assert_array(&self) -> Result<&Self, ContractViolation> {
        if self.json()?.is_array() {
            Ok(self)
        } else {
            Err(self.body_violation("expected a JSON array"))
        }
    }

    /// The body must be a JSON array with at least one element.
    ///
    /// # Errors
    /// Otherwise.
    pub fn assert_non_empty_array(&self) -> Result<&Self, ContractViolation> {
        match self.json()?.as_array() {
            Some(items) if !items.is_empty() => Ok(self),
            Some(_) => Err(self.body_violation("expected a non-empty JSON array, got []")),
            None => Err(self.body_violation("expected a JSON array")),
        }
    }

    /// Every element of the array body must satisfy `schema`.
    ///
    /// # Errors
    /// On the first element that does not.
    pub fn assert_every_element(&self, schema: &ResourceSchema) -> Result<&Self, ContractViolation> {
        check_collection(schema, &self.json()?)
            .map_err(|mismatch| self.violation(mismatch.into()))?;
        Ok(self)
    }
}

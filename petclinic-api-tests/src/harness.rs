//! Tests of the harness itself, run against local mock servers.
//!
//! These check that the profiles send what they promise, that the logging
//! filters capture both halves of an exchange, and that each assertion family
//! reports failures with the full exchange attached.
#![cfg(test)]

use crate::{
    contract_test_against, endpoints, fixtures,
    model::{OwnerRequest, Vet},
    schema, ContractViolation, Harness, HarnessError, ProfileKind, TestingTools, ViolationKind,
    MAX_RESPONSE_TIME, REQUEST_SENT,
};
use anyhow::Result;
use httpmock::prelude::*;
use petclinic_settings::{BaseUrlSource, ResolvedBaseUrl, Settings};
use pretty_assertions::assert_eq;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    StatusCode,
};
use serde_json::json;
use std::time::Duration;
use tracing::Level;

#[tokio::test]
async fn read_profile_accepts_json_without_a_content_type() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(endpoints::VETS)
                .header("accept", "application/json")
                .header_missing("content-type");
            then.status(200).json_body(json!([]));
        })
        .await;

    contract_test_against(
        server.base_url(),
        "read_profile_headers",
        |TestingTools { profiles, .. }| async move {
            assert_eq!(profiles.read.kind(), ProfileKind::Read);
            assert!(profiles.read.headers().get(CONTENT_TYPE).is_none());

            profiles
                .read
                .get(endpoints::VETS)
                .send()
                .await?
                .assert_status(StatusCode::OK)?
                .assert_array()?;
            Ok::<_, anyhow::Error>(())
        },
    )
    .await?;

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn write_profile_sends_a_json_body() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(endpoints::OWNERS)
                .header("accept", "application/json")
                .header("content-type", "application/json")
                .json_body(json!({
                    "firstName": "George",
                    "lastName": "Franklin",
                    "address": "123 Test Street",
                    "city": "New York",
                    "telephone": "1234567890",
                }));
            then.status(201).json_body(json!({
                "id": 42,
                "firstName": "George",
                "lastName": "Franklin",
                "address": "123 Test Street",
                "city": "New York",
                "telephone": "1234567890",
                "pets": [],
            }));
        })
        .await;

    let owner_id = contract_test_against(
        server.base_url(),
        "write_profile_body",
        |TestingTools { profiles, .. }| async move {
            assert_eq!(
                profiles.write.headers().get(ACCEPT).map(|v| v.as_bytes()),
                Some(&b"application/json"[..])
            );
            fixtures::create_owner(&profiles, &OwnerRequest::new("George", "Franklin")).await
        },
    )
    .await?;

    assert_eq!(owner_id, 42);
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn fixtures_reject_ids_that_are_not_positive() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(endpoints::OWNERS);
            then.status(201).json_body(json!({"id": 0, "pets": []}));
        })
        .await;

    let error = contract_test_against(
        server.base_url(),
        "fixture_id",
        |TestingTools { profiles, .. }| async move {
            fixtures::create_owner(&profiles, &OwnerRequest::new("Zero", "Id")).await
        },
    )
    .await
    .expect_err("an id of 0 must not be accepted");

    let violation = error
        .downcast_ref::<ContractViolation>()
        .expect("should be a contract violation");
    assert!(matches!(violation.kind, ViolationKind::Body(_)));
}

#[tokio::test]
async fn status_mismatch_reports_the_whole_exchange() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(endpoints::OWNERS);
            then.status(500).body("database on fire");
        })
        .await;

    let violation = contract_test_against(
        server.base_url(),
        "status_mismatch",
        |TestingTools { profiles, .. }| async move {
            let exchange = profiles
                .read
                .get(endpoints::OWNERS)
                .send()
                .await
                .expect("the mock server answers");
            exchange.assert_status(StatusCode::OK).map(|_| ()).unwrap_err()
        },
    )
    .await;

    assert!(matches!(
        violation.kind,
        ViolationKind::Status { expected, actual }
            if expected == StatusCode::OK && actual == StatusCode::INTERNAL_SERVER_ERROR
    ));
    let report = violation.to_string();
    assert!(report.contains("Request method:\tGET"), "{}", report);
    assert!(report.contains(endpoints::OWNERS), "{}", report);
    assert!(report.contains("database on fire"), "{}", report);
}

#[tokio::test]
async fn only_the_call_under_test_is_timed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(endpoints::VETS);
            then.status(200)
                .delay(Duration::from_millis(250))
                .json_body(json!([]));
        })
        .await;

    contract_test_against(
        server.base_url(),
        "timing",
        |TestingTools { profiles, .. }| async move {
            let exchange = profiles
                .read
                .get(endpoints::VETS)
                .send()
                .await
                .expect("the mock server answers");

            assert!(exchange.elapsed >= Duration::from_millis(250));
            assert!(exchange.assert_faster_than(Duration::from_secs(10)).is_ok());
            assert!(exchange.assert_within_ceiling().is_ok());

            let violation = exchange
                .assert_faster_than(Duration::from_millis(100))
                .map(|_| ())
                .unwrap_err();
            assert!(matches!(
                violation.kind,
                ViolationKind::Timing { limit, .. } if limit == Duration::from_millis(100)
            ));
        },
    )
    .await;

    assert_eq!(MAX_RESPONSE_TIME, Duration::from_millis(2000));
}

#[tokio::test]
async fn logging_filters_capture_request_and_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(endpoints::VETS);
            then.status(200).json_body(json!([]));
        })
        .await;

    contract_test_against(
        server.base_url(),
        "logging_filters",
        |TestingTools {
             profiles, mut logs, ..
         }| async move {
            let exchange = profiles
                .read
                .get(endpoints::VETS)
                .send()
                .await
                .expect("the mock server answers");

            {
                let sent = logs
                    .request_sent(&exchange.request)
                    .expect("the request was logged");
                assert_eq!(sent.level, Level::INFO);
                assert_eq!(sent.scenario(), Some("logging_filters"));
                assert!(sent
                    .str_field("headers")
                    .map_or(false, |headers| headers.contains("application/json")));
            }
            {
                let received = logs
                    .response_received(&exchange)
                    .expect("the response was logged");
                assert!(received.field_eq("body", "[]"));
                assert!(received.field_eq("method", "GET"));
            }
            assert!(logs.rejected_lines().is_empty());
        },
    )
    .await;
}

#[tokio::test]
async fn schema_violations_name_the_offending_element() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(endpoints::VETS);
            then.status(200).json_body(json!([
                {
                    "id": 1,
                    "firstName": "James",
                    "lastName": "Carter",
                    "specialties": [{"id": 1, "name": "radiology"}],
                    "nrOfSpecialties": 1,
                },
                {
                    "id": 2,
                    "firstName": "Helen",
                    "lastName": "Leary",
                    "specialties": [],
                },
            ]));
        })
        .await;

    let violation = contract_test_against(
        server.base_url(),
        "schema_violation",
        |TestingTools { profiles, .. }| async move {
            let exchange = profiles
                .read
                .get(endpoints::VETS)
                .send()
                .await
                .expect("the mock server answers");
            assert!(exchange.assert_non_empty_array().is_ok());
            exchange
                .assert_every_element(&schema::VET)
                .map(|_| ())
                .unwrap_err()
        },
    )
    .await;

    match violation.kind {
        ViolationKind::Schema(schema::SchemaMismatch::MissingKey { path, key, .. }) => {
            assert_eq!(path, "$[1]");
            assert_eq!(key, "nrOfSpecialties");
        }
        other => panic!("unexpected violation: {:?}", other),
    }
}

#[tokio::test]
async fn updates_are_checked_for_an_empty_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path(endpoints::owner(7));
            then.status(204);
        })
        .await;

    contract_test_against(
        server.base_url(),
        "empty_body",
        |TestingTools { profiles, .. }| async move {
            let exchange = profiles
                .write
                .put(&endpoints::owner(7))
                .json(&OwnerRequest::new("Harold", "Updated"))
                .expect("owner requests always encode")
                .send()
                .await
                .expect("the mock server answers");

            assert!(exchange
                .assert_status(StatusCode::NO_CONTENT)
                .and_then(|exchange| exchange.assert_empty_body())
                .is_ok());
            assert!(exchange.assert_body_present().is_err());
            assert!(exchange.assert_field_present("id").is_err());
        },
    )
    .await;
}

#[tokio::test]
async fn query_parameters_are_sent() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(endpoints::VISITS_BY_PET)
                .query_param("petId", "7");
            then.status(200).json_body(json!({"items": []}));
        })
        .await;

    contract_test_against(
        server.base_url(),
        "query_parameters",
        |TestingTools { profiles, .. }| async move {
            let exchange = profiles
                .read
                .get(endpoints::VISITS_BY_PET)
                .query("petId", 7)
                .send()
                .await?;
            exchange
                .assert_status(StatusCode::OK)?
                .assert_field_eq("items", json!([]))?;
            assert!(exchange.request.url.ends_with("?petId=7"));
            Ok::<_, anyhow::Error>(())
        },
    )
    .await?;

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn field_mismatches_show_both_values() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(endpoints::owner(3));
            then.status(200)
                .json_body(json!({"id": 3, "firstName": "Eduardo", "lastName": "Rodriquez"}));
        })
        .await;

    contract_test_against(
        server.base_url(),
        "field_mismatch",
        |TestingTools { profiles, .. }| async move {
            let exchange = profiles
                .read
                .get(&endpoints::owner(3))
                .send()
                .await
                .expect("the mock server answers");

            assert!(exchange.assert_field_eq("id", 3).is_ok());
            let report = exchange
                .assert_field_eq("firstName", "George")
                .map(|_| ())
                .unwrap_err()
                .to_string();
            assert!(report.contains(r#"expected `firstName` to be "George", got "Eduardo""#));
            assert!(exchange.assert_field_present("pets").is_err());
            assert_eq!(exchange.positive_id("id").ok(), Some(3));
        },
    )
    .await;
}

#[tokio::test]
async fn unreachable_targets_fail_with_a_transport_error() {
    // Port 9 is the discard service, which is never listening in CI.
    let error = contract_test_against(
        "http://127.0.0.1:9",
        "unreachable",
        |TestingTools { profiles, .. }| async move {
            profiles
                .read
                .get(endpoints::OWNERS)
                .send()
                .await
                .map(|_| ())
                .unwrap_err()
        },
    )
    .await;

    match error {
        HarnessError::Transport { method, url, .. } => {
            assert_eq!(method, reqwest::Method::GET);
            assert_eq!(url, format!("http://127.0.0.1:9{}", endpoints::OWNERS));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn the_ceiling_rejects_a_response_slower_than_two_seconds() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(endpoints::OWNERS);
            then.status(200)
                .delay(MAX_RESPONSE_TIME + Duration::from_millis(100))
                .json_body(json!([]));
        })
        .await;

    let violation = contract_test_against(
        server.base_url(),
        "ceiling",
        |TestingTools { profiles, .. }| async move {
            let exchange = profiles
                .read
                .get(endpoints::OWNERS)
                .send()
                .await
                .expect("the mock server answers");
            assert!(exchange.assert_status(StatusCode::OK).is_ok());
            exchange.assert_within_ceiling().map(|_| ()).unwrap_err()
        },
    )
    .await;

    match violation.kind {
        ViolationKind::Timing { limit, elapsed } => {
            assert_eq!(limit, MAX_RESPONSE_TIME);
            assert!(elapsed >= MAX_RESPONSE_TIME);
        }
        other => panic!("unexpected violation: {:?}", other),
    }
}

#[tokio::test]
async fn an_empty_list_is_not_a_non_empty_array() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(endpoints::VETS);
            then.status(200).json_body(json!([]));
        })
        .await;

    contract_test_against(
        server.base_url(),
        "empty_list",
        |TestingTools { profiles, .. }| async move {
            let exchange = profiles
                .read
                .get(endpoints::VETS)
                .send()
                .await
                .expect("the mock server answers");

            assert!(exchange.assert_array().is_ok());
            assert!(exchange.assert_every_element(&schema::VET).is_ok());

            let violation = exchange.assert_non_empty_array().map(|_| ()).unwrap_err();
            assert!(matches!(violation.kind, ViolationKind::Body(_)));
            assert!(violation
                .to_string()
                .starts_with("unexpected body: expected a non-empty JSON array, got []"));
        },
    )
    .await;
}

#[tokio::test]
async fn decode_failures_name_the_json_path() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(endpoints::VETS);
            then.status(200).json_body(json!([{
                "id": 1,
                "firstName": "James",
                "lastName": "Carter",
                "specialties": [{"id": 1, "name": null}],
                "nrOfSpecialties": 1,
            }]));
        })
        .await;

    contract_test_against(
        server.base_url(),
        "decode_path",
        |TestingTools { profiles, .. }| async move {
            let exchange = profiles
                .read
                .get(endpoints::VETS)
                .send()
                .await
                .expect("the mock server answers");

            let report = exchange
                .decode::<Vec<Vet>>()
                .map(|_| ())
                .unwrap_err()
                .to_string();
            assert!(report.contains("at `[0].specialties[0].name`"), "{}", report);

            let violation = exchange
                .assert_every_element(&schema::VET)
                .map(|_| ())
                .unwrap_err();
            assert!(matches!(
                violation.kind,
                ViolationKind::Schema(schema::SchemaMismatch::NullValue { key: "name", .. })
            ));
        },
    )
    .await;
}

#[tokio::test]
async fn relative_paths_are_rejected_before_sending() {
    let error = contract_test_against(
        "http://127.0.0.1:9",
        "relative_path",
        |TestingTools {
             profiles, mut logs, ..
         }| async move {
            let error = profiles
                .read
                .get("api/vet/vets")
                .send()
                .await
                .map(|_| ())
                .unwrap_err();
            assert!(!logs.has(|event| event.message() == Some(REQUEST_SENT)));
            error
        },
    )
    .await;

    match error {
        HarnessError::RelativePath { path } => assert_eq!(path, "api/vet/vets"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn harness_keeps_the_target_it_was_given() {
    let harness = Harness::with_target(
        Settings::load_for_tests(|_| ()),
        ResolvedBaseUrl {
            url: "http://petclinic.test:8080/".to_string(),
            source: BaseUrlSource::Default,
        },
    )
    .expect("harness builds");

    assert_eq!(harness.settings().env, "test");
    assert_eq!(harness.target().source, BaseUrlSource::Default);
    assert_eq!(harness.target().url, "http://petclinic.test:8080/");

    let profiles = harness.profiles();
    assert_eq!(profiles.read.base_url(), "http://petclinic.test:8080");
    assert_eq!(profiles.write.base_url(), "http://petclinic.test:8080");
    assert_eq!(profiles.write.kind(), ProfileKind::Write);
}

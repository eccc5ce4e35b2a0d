//! Visits, recorded against a pet.
#![cfg(test)]

use crate::{contract_test_macro, endpoints, fixtures, model::VisitRequest, schema, TestingTools};
use anyhow::Result;
use reqwest::StatusCode;

#[contract_test_macro]
async fn create_visit_returns_201(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    let (_, pet_id) = fixtures::create_owner_with_pet(&profiles, "Rosy").await?;

    let exchange = profiles
        .write
        .post(&endpoints::pet_visits(pet_id))
        .json(&VisitRequest::new("Annual vaccination"))?
        .send()
        .await?;

    exchange
        .assert_status(StatusCode::CREATED)?
        .assert_field_eq("description", "Annual vaccination")?
        .assert_field_eq("petId", pet_id)?
        .assert_within_ceiling()?;
    exchange.positive_id("id")?;

    Ok(())
}

#[contract_test_macro]
async fn visits_by_pet_lists_recorded_visits(
    TestingTools { profiles, .. }: TestingTools,
) -> Result<()> {
    let (_, pet_id) = fixtures::create_owner_with_pet(&profiles, "Jewel").await?;
    profiles
        .write
        .post(&endpoints::pet_visits(pet_id))
        .json(&VisitRequest::new("Dental cleaning"))?
        .send()
        .await?
        .assert_status(StatusCode::CREATED)?;

    let exchange = profiles
        .read
        .get(endpoints::VISITS_BY_PET)
        .query("petId", pet_id)
        .send()
        .await?;
    exchange
        .assert_status(StatusCode::OK)?
        .assert_within_ceiling()?;

    let body = exchange.json()?;
    let items = &body["items"];
    schema::check_collection(&schema::VISIT, items)
        .map_err(|mismatch| exchange.violation(mismatch.into()))?;
    let recorded = items
        .as_array()
        .map_or(false, |visits| {
            visits
                .iter()
                .any(|visit| visit["petId"] == pet_id && visit["description"] == "Dental cleaning")
        });
    assert!(recorded, "visit for pet {} is not listed", pet_id);

    Ok(())
}

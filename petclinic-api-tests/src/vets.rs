//! The vets resource, which is read only.
#![cfg(test)]

use crate::{contract_test_macro, endpoints, model::Vet, schema, TestingTools};
use anyhow::Result;
use reqwest::StatusCode;

#[contract_test_macro]
async fn list_vets_returns_a_non_empty_array(
    TestingTools { profiles, .. }: TestingTools,
) -> Result<()> {
    profiles
        .read
        .get(endpoints::VETS)
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .assert_non_empty_array()?;

    Ok(())
}

#[contract_test_macro]
async fn list_vets_is_fast_enough(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    profiles
        .read
        .get(endpoints::VETS)
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .assert_within_ceiling()?;

    Ok(())
}

#[contract_test_macro]
async fn every_vet_has_required_fields(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    profiles
        .read
        .get(endpoints::VETS)
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .assert_every_element(&schema::VET)?;

    Ok(())
}

#[contract_test_macro]
async fn specialties_are_well_formed(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    let exchange = profiles.read.get(endpoints::VETS).send().await?;
    exchange.assert_status(StatusCode::OK)?;

    // Decoding already rejects a specialty without an id or a name.
    let vets: Vec<Vet> = exchange.decode()?;
    assert!(
        vets.iter().any(|vet| !vet.specialties.is_empty()),
        "expected at least one vet with specialties in the response"
    );

    Ok(())
}

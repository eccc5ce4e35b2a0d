//! Reachability probes, one per top level resource.
//!
//! These are cheap and have no side effects. If they fail there is little
//! point reading the rest of the run.
#![cfg(test)]

use crate::{contract_test_macro, endpoints, TestingTools};
use anyhow::Result;
use reqwest::StatusCode;

#[contract_test_macro]
async fn owners_endpoint_is_reachable(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    profiles
        .read
        .get(endpoints::OWNERS)
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .assert_body_present()?
        .assert_within_ceiling()?;

    Ok(())
}

#[contract_test_macro]
async fn vets_endpoint_is_reachable(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    profiles
        .read
        .get(endpoints::VETS)
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .assert_body_present()?
        .assert_within_ceiling()?;

    Ok(())
}

#[contract_test_macro]
async fn visits_endpoint_is_reachable(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    profiles
        .read
        .get(&endpoints::pet_visits(1))
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .assert_within_ceiling()?;

    Ok(())
}

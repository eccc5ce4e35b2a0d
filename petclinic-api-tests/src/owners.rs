//! The owners resource: create, list, read and update.
#![cfg(test)]

use crate::{
    contract_test_macro, endpoints, fixtures,
    model::{Owner, OwnerRequest},
    schema, TestingTools,
};
use anyhow::Result;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;

#[contract_test_macro]
async fn create_owner_returns_201_with_body(
    TestingTools { profiles, .. }: TestingTools,
) -> Result<()> {
    let exchange = profiles
        .write
        .post(endpoints::OWNERS)
        .json(&OwnerRequest::new("George", "Franklin"))?
        .send()
        .await?;

    exchange
        .assert_status(StatusCode::CREATED)?
        .assert_field_present("id")?
        .assert_field_eq("firstName", "George")?
        .assert_field_eq("lastName", "Franklin")?
        .assert_field_eq("address", "123 Test Street")?
        .assert_field_eq("city", "New York")?
        .assert_field_eq("telephone", "1234567890")?
        .assert_field_eq("pets", json!([]))?;
    exchange.positive_id("id")?;

    Ok(())
}

#[contract_test_macro]
async fn list_owners_returns_an_array(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    profiles
        .read
        .get(endpoints::OWNERS)
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .assert_array()?;

    Ok(())
}

#[contract_test_macro]
async fn list_owners_is_fast_enough(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    profiles
        .read
        .get(endpoints::OWNERS)
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .assert_within_ceiling()?;

    Ok(())
}

#[contract_test_macro]
async fn every_listed_owner_has_required_fields(
    TestingTools { profiles, .. }: TestingTools,
) -> Result<()> {
    // So the list can't be empty.
    fixtures::create_named_owner(&profiles, "Schema", "Test").await?;

    profiles
        .read
        .get(endpoints::OWNERS)
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .assert_non_empty_array()?
        .assert_every_element(&schema::OWNER)?;

    Ok(())
}

#[contract_test_macro]
async fn get_owner_returns_what_was_created(
    TestingTools { profiles, .. }: TestingTools,
) -> Result<()> {
    let created = profiles
        .write
        .post(endpoints::OWNERS)
        .json(&OwnerRequest::new("John", "Doe"))?
        .send()
        .await?;
    created.assert_status(StatusCode::CREATED)?;
    let created: Owner = created.decode()?;
    assert!(created.id > 0, "owner id {} is not positive", created.id);

    let exchange = profiles.read.get(&endpoints::owner(created.id)).send().await?;
    exchange
        .assert_status(StatusCode::OK)?
        .assert_field_eq("id", created.id)?
        .assert_field_eq("firstName", "John")?
        .assert_field_eq("lastName", "Doe")?
        .assert_field_eq("address", "123 Test Street")?
        .assert_field_eq("telephone", "1234567890")?
        .assert_field_present("pets")?
        .assert_within_ceiling()?;

    let fetched: Owner = exchange.decode()?;
    assert_eq!(fetched, created);

    Ok(())
}

#[contract_test_macro]
async fn update_owner_returns_204_and_persists(
    TestingTools { profiles, .. }: TestingTools,
) -> Result<()> {
    let owner_id = fixtures::create_named_owner(&profiles, "Harold", "Smith").await?;
    let update = OwnerRequest::new("Harold", "Updated")
        .with_address("456 New Avenue")
        .with_city("Boston")
        .with_telephone("9876543210");

    profiles
        .write
        .put(&endpoints::owner(owner_id))
        .json(&update)?
        .send()
        .await?
        .assert_status(StatusCode::NO_CONTENT)?
        .assert_empty_body()?
        .assert_within_ceiling()?;

    // The update must be visible to a follow-up read.
    let fetched: Owner = profiles
        .read
        .get(&endpoints::owner(owner_id))
        .send()
        .await?
        .assert_status(StatusCode::OK)?
        .decode()?;
    assert_eq!(fetched.id, owner_id);
    assert_eq!(fetched.first_name, update.first_name);
    assert_eq!(fetched.last_name, update.last_name);
    assert_eq!(fetched.address, update.address);
    assert_eq!(fetched.city, update.city);
    assert_eq!(fetched.telephone, update.telephone);

    Ok(())
}

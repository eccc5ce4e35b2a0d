//! Pets, which only exist under an owner.
#![cfg(test)]

use crate::{
    contract_test_macro, endpoints, fixtures,
    model::{Pet, PetRequest},
    TestingTools,
};
use anyhow::Result;
use reqwest::StatusCode;

#[contract_test_macro]
async fn create_pet_returns_201_with_id(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    let owner_id = fixtures::create_named_owner(&profiles, "Pet", "Keeper").await?;

    let exchange = profiles
        .write
        .post(&endpoints::owner_pets(owner_id))
        .json(&PetRequest::new("Leo"))?
        .send()
        .await?;

    exchange
        .assert_status(StatusCode::CREATED)?
        .assert_field_eq("name", "Leo")?
        .assert_within_ceiling()?;
    exchange.positive_id("id")?;

    Ok(())
}

#[contract_test_macro]
async fn get_pet_returns_the_created_pet(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
    let (owner_id, pet_id) = fixtures::create_owner_with_pet(&profiles, "Basil").await?;

    let exchange = profiles
        .read
        .get(&endpoints::owner_pet(owner_id, pet_id))
        .send()
        .await?;

    exchange
        .assert_status(StatusCode::OK)?
        .assert_field_eq("id", pet_id)?
        .assert_field_eq("name", "Basil")?
        .assert_within_ceiling()?;
    let pet: Pet = exchange.decode()?;
    assert_eq!(pet.id, pet_id);

    Ok(())
}

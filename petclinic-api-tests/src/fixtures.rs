//! Setup calls that scenarios make before the call they actually test.
//!
//! Each fixture goes through the write profile, insists on a 201 and a
//! positive id, and hands the id back. A fixture failure fails the scenario
//! that needed it. Fixtures are never shared between scenarios, and nothing
//! is deleted afterwards.

use crate::{
    endpoints,
    model::{OwnerRequest, PetRequest},
    utils::profiles::Profiles,
};
use anyhow::{Context, Result};
use reqwest::StatusCode;

/// Create an owner and return its id.
pub async fn create_owner(profiles: &Profiles, owner: &OwnerRequest) -> Result<i64> {
    let exchange = profiles
        .write
        .post(endpoints::OWNERS)
        .json(owner)?
        .send()
        .await?;
    exchange.assert_status(StatusCode::CREATED)?;
    let id = exchange.positive_id("id")?;
    tracing::debug!(owner_id = id, "created owner fixture");
    Ok(id)
}

/// Create an owner with the given names and default contact details.
pub async fn create_named_owner(profiles: &Profiles, first_name: &str, last_name: &str) -> Result<i64> {
    create_owner(profiles, &OwnerRequest::new(first_name, last_name))
        .await
        .with_context(|| format!("creating owner fixture {} {}", first_name, last_name))
}

/// Add a pet to an existing owner and return the pet's id.
pub async fn create_pet(profiles: &Profiles, owner_id: i64, pet: &PetRequest) -> Result<i64> {
    let exchange = profiles
        .write
        .post(&endpoints::owner_pets(owner_id))
        .json(pet)?
        .send()
        .await?;
    exchange.assert_status(StatusCode::CREATED)?;
    let id = exchange.positive_id("id")?;
    tracing::debug!(owner_id, pet_id = id, "created pet fixture");
    Ok(id)
}

/// Create a fresh owner with one pet, returning `(owner_id, pet_id)`.
pub async fn create_owner_with_pet(profiles: &Profiles, pet_name: &str) -> Result<(i64, i64)> {
    let owner_id = create_named_owner(profiles, "Fixture", "PetOwner").await?;
    let pet_id = create_pet(profiles, owner_id, &PetRequest::new(pet_name))
        .await
        .with_context(|| format!("creating pet fixture for owner {}", owner_id))?;
    Ok((owner_id, pet_id))
}

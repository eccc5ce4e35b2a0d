//! Negative paths, grouped by resource.
//!
//! Every scenario here expects the service to reject the call, and asserts
//! the exact status it rejects it with:
//!
//! - a blank or missing required field, or a malformed telephone: 400
//! - a non-positive id in the path: 400, because that is a malformed request,
//!   not a lookup
//! - a well formed id that was never assigned: 404
//! - a method the route does not support: 405
//!
//! Reading an owner by an unknown id is deliberately not covered. The service
//! does not currently define what that returns.
#![cfg(test)]

/// An id no run will ever have assigned.
const UNASSIGNED_ID: i64 = 999_999;

mod owners {
    use super::UNASSIGNED_ID;
    use crate::{
        contract_test_macro, endpoints, fixtures,
        model::{EmptyBody, OwnerRequest},
        TestingTools,
    };
    use anyhow::Result;
    use reqwest::StatusCode;

    #[contract_test_macro]
    async fn create_owner_with_blank_first_name_returns_400(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        profiles
            .write
            .post(endpoints::OWNERS)
            .json(&OwnerRequest::new("", "Franklin"))?
            .send()
            .await?
            .assert_status(StatusCode::BAD_REQUEST)?;

        Ok(())
    }

    #[contract_test_macro]
    async fn create_owner_with_blank_last_name_returns_400(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        profiles
            .write
            .post(endpoints::OWNERS)
            .json(&OwnerRequest::new("George", "   "))?
            .send()
            .await?
            .assert_status(StatusCode::BAD_REQUEST)?;

        Ok(())
    }

    #[contract_test_macro]
    async fn create_owner_with_non_numeric_telephone_returns_400(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        profiles
            .write
            .post(endpoints::OWNERS)
            .json(&OwnerRequest::new("George", "Franklin").with_telephone("not-a-number"))?
            .send()
            .await?
            .assert_status(StatusCode::BAD_REQUEST)?;

        Ok(())
    }

    #[contract_test_macro]
    async fn create_owner_with_empty_body_returns_400(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        profiles
            .write
            .post(endpoints::OWNERS)
            .json(&EmptyBody::default())?
            .send()
            .await?
            .assert_status(StatusCode::BAD_REQUEST)?;

        Ok(())
    }

    #[contract_test_macro]
    async fn update_unassigned_owner_returns_404(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        profiles
            .write
            .put(&endpoints::owner(UNASSIGNED_ID))
            .json(&OwnerRequest::new("Ghost", "Owner"))?
            .send()
            .await?
            .assert_status(StatusCode::NOT_FOUND)?;

        Ok(())
    }

    #[contract_test_macro]
    async fn update_owner_zero_returns_400(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
        profiles
            .write
            .put(&endpoints::owner(0))
            .json(&OwnerRequest::new("Zero", "Owner"))?
            .send()
            .await?
            .assert_status(StatusCode::BAD_REQUEST)?;

        Ok(())
    }

    #[contract_test_macro]
    async fn update_owner_with_blank_last_name_returns_400(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        let owner_id = fixtures::create_named_owner(&profiles, "Error", "TestOwner").await?;

        profiles
            .write
            .put(&endpoints::owner(owner_id))
            .json(&OwnerRequest::new("Validation", ""))?
            .send()
            .await?
            .assert_status(StatusCode::BAD_REQUEST)?;

        Ok(())
    }
}

mod pets {
    use super::UNASSIGNED_ID;
    use crate::{
        contract_test_macro, endpoints,
        model::{EmptyBody, PetRequest},
        TestingTools,
    };
    use anyhow::Result;
    use reqwest::StatusCode;

    #[contract_test_macro]
    async fn get_unassigned_pet_returns_404(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
        profiles
            .read
            .get(&endpoints::any_owner_pet(UNASSIGNED_ID))
            .send()
            .await?
            .assert_status(StatusCode::NOT_FOUND)?;

        Ok(())
    }

    #[contract_test_macro]
    async fn create_pet_for_unassigned_owner_returns_404(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        profiles
            .write
            .post(&endpoints::owner_pets(UNASSIGNED_ID))
            .json(&PetRequest::new("Fluffy"))?
            .send()
            .await?
            .assert_status(StatusCode::NOT_FOUND)?
            .assert_field_eq("status", 404)?
            .assert_field_eq("error", "Not Found")?;

        Ok(())
    }

    #[contract_test_macro]
    async fn create_pet_for_owner_zero_returns_400(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        profiles
            .write
            .post(&endpoints::owner_pets(0))
            .json(&EmptyBody::default())?
            .send()
            .await?
            .assert_status(StatusCode::BAD_REQUEST)?;

        Ok(())
    }
}

mod visits {
    use crate::{contract_test_macro, endpoints, model::VisitRequest, TestingTools};
    use anyhow::Result;
    use reqwest::StatusCode;

    #[contract_test_macro]
    async fn visits_by_pet_without_pet_id_returns_400(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        profiles
            .read
            .get(endpoints::VISITS_BY_PET)
            .send()
            .await?
            .assert_status(StatusCode::BAD_REQUEST)?;

        Ok(())
    }

    #[contract_test_macro]
    async fn create_visit_for_pet_zero_returns_400(
        TestingTools { profiles, .. }: TestingTools,
    ) -> Result<()> {
        profiles
            .write
            .post(&endpoints::pet_visits(0))
            .json(&VisitRequest::new("Regular checkup"))?
            .send()
            .await?
            .assert_status(StatusCode::BAD_REQUEST)?;

        Ok(())
    }
}

mod vets {
    use crate::{contract_test_macro, endpoints, TestingTools};
    use anyhow::Result;
    use reqwest::StatusCode;

    #[contract_test_macro]
    async fn post_to_vets_returns_405(TestingTools { profiles, .. }: TestingTools) -> Result<()> {
        profiles
            .write
            .post(endpoints::VETS)
            .send()
            .await?
            .assert_status(StatusCode::METHOD_NOT_ALLOWED)?;

        Ok(())
    }
}

//! Paths exposed by the API gateway.
//!
//! These are the public contract. Changing one here means the service changed
//! its URLs, which is exactly what these tests exist to notice.

/// Owner collection.
pub const OWNERS: &str = "/api/customer/owners";

/// Vet collection.
pub const VETS: &str = "/api/vet/vets";

/// Prefix for the visits service.
pub const VISITS: &str = "/api/visit";

/// Visits for a set of pets, selected by the `petId` query parameter.
pub const VISITS_BY_PET: &str = "/api/visit/pets/visits";

/// A single owner.
pub fn owner(owner_id: i64) -> String {
    format!("{}/{}", OWNERS, owner_id)
}

/// The pets of an owner, for creating one.
pub fn owner_pets(owner_id: i64) -> String {
    format!("{}/{}/pets", OWNERS, owner_id)
}

/// A pet of a specific owner.
pub fn owner_pet(owner_id: i64, pet_id: i64) -> String {
    format!("{}/{}/pets/{}", OWNERS, owner_id, pet_id)
}

/// A pet of any owner. The service matches the owner segment as a wildcard.
pub fn any_owner_pet(pet_id: i64) -> String {
    format!("{}/*/pets/{}", OWNERS, pet_id)
}

/// The visits of a pet, for reading or recording one.
pub fn pet_visits(pet_id: i64) -> String {
    format!("{}/owners/*/pets/{}/visits", VISITS, pet_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_are_built_under_their_parents() {
        assert_eq!(owner(7), "/api/customer/owners/7");
        assert_eq!(owner_pets(0), "/api/customer/owners/0/pets");
        assert_eq!(owner_pet(7, 9), "/api/customer/owners/7/pets/9");
        assert_eq!(any_owner_pet(999999), "/api/customer/owners/*/pets/999999");
        assert_eq!(pet_visits(1), "/api/visit/owners/*/pets/1/visits");
    }
}

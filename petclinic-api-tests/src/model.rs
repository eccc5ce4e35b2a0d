//! Wire-level payloads for the petclinic API.
//!
//! Requests are typed builders with a fixed shape per resource. Required
//! fields are constructor arguments, everything else has a valid default that
//! can be replaced. Responses are decoded only as far as scenarios need.

use serde::{Deserialize, Serialize};

/// Body for creating or updating an owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRequest {
    /// Required, must not be blank.
    pub first_name: String,
    /// Required, must not be blank.
    pub last_name: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Required, digits only.
    pub telephone: String,
}

impl OwnerRequest {
    /// A valid owner with the given names and a default address.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            address: "123 Test Street".to_string(),
            city: "New York".to_string(),
            telephone: "1234567890".to_string(),
        }
    }

    /// Replace the street address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Replace the city.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Replace the telephone number.
    pub fn with_telephone(mut self, telephone: impl Into<String>) -> Self {
        self.telephone = telephone.into();
        self
    }
}

/// Body for adding a pet to an owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetRequest {
    /// The pet's name.
    pub name: String,
    /// `yyyy-mm-dd`.
    pub birth_date: String,
    /// One of the pet types seeded in the service.
    pub type_id: i64,
}

impl PetRequest {
    /// A pet of the first seeded type, born on 2020-01-01.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birth_date: "2020-01-01".to_string(),
            type_id: 1,
        }
    }
}

/// Body for recording a visit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    /// `yyyy-mm-dd`.
    pub visit_date: String,
    /// Free text.
    pub description: String,
}

impl VisitRequest {
    /// A visit on 2022-01-01.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            visit_date: "2022-01-01".to_string(),
            description: description.into(),
        }
    }
}

/// Serializes as `{}`, for requests that deliberately omit every field.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct EmptyBody {}

/// An owner as the service returns it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Assigned by the service.
    pub id: i64,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Telephone.
    pub telephone: String,
    /// Filled in by the service, empty for a new owner.
    pub pets: Vec<Pet>,
}

/// A pet as nested in an owner, or as returned on creation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    /// Assigned by the service.
    pub id: i64,
    /// The pet's name.
    pub name: String,
    /// `yyyy-mm-dd`, if the service includes it.
    #[serde(default)]
    pub birth_date: Option<String>,
}

/// A vet, read only.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vet {
    /// Identifier.
    pub id: i64,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Possibly empty.
    pub specialties: Vec<Specialty>,
    /// Should match `specialties.len()`.
    pub nr_of_specialties: i64,
}

/// A vet's specialty.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Specialty {
    /// Identifier.
    pub id: i64,
    /// Never null.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::{EmptyBody, OwnerRequest, PetRequest, VisitRequest};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn owner_request_uses_camel_case_keys() {
        let body = OwnerRequest::new("George", "Franklin");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "firstName": "George",
                "lastName": "Franklin",
                "address": "123 Test Street",
                "city": "New York",
                "telephone": "1234567890",
            })
        );
    }

    #[test]
    fn owner_request_builders_replace_defaults() {
        let body = OwnerRequest::new("Harold", "Updated")
            .with_address("456 New Avenue")
            .with_city("Boston")
            .with_telephone("9876543210");
        assert_eq!(body.address, "456 New Avenue");
        assert_eq!(body.city, "Boston");
        assert_eq!(body.telephone, "9876543210");
        assert_eq!(body.first_name, "Harold");
    }

    #[test]
    fn pet_and_visit_requests_serialize_their_dates() {
        assert_eq!(
            serde_json::to_value(PetRequest::new("Fluffy")).unwrap(),
            json!({"name": "Fluffy", "birthDate": "2020-01-01", "typeId": 1})
        );
        assert_eq!(
            serde_json::to_value(VisitRequest::new("Regular checkup")).unwrap(),
            json!({"visitDate": "2022-01-01", "description": "Regular checkup"})
        );
    }

    #[test]
    fn empty_body_is_an_empty_object() {
        assert_eq!(serde_json::to_string(&EmptyBody::default()).unwrap(), "{}");
    }
}

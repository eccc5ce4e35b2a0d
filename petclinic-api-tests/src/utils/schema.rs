//! Shape checks for list responses.
//!
//! A [`ResourceSchema`] lists the keys every element of a list must carry.
//! Checks never depend on how many elements there are, since the service
//! under test accumulates records from every run.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The JSON type a key must hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonKind {
    /// An integral number.
    Integer,
    /// A string.
    String,
    /// An array.
    Array,
    /// An object.
    Object,
}

impl JsonKind {
    /// Does `value` have this kind?
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::String => value.is_string(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// The required shape of one resource in a list response.
#[derive(Debug)]
pub struct ResourceSchema {
    /// Used in failure messages.
    pub name: &'static str,
    /// Keys that must be present, possibly with a null value.
    pub required_keys: &'static [&'static str],
    /// Keys that must be present and not null.
    pub non_null_keys: &'static [&'static str],
    /// Type constraints on keys, checked when the value is not null.
    pub kinds: &'static [(&'static str, JsonKind)],
    /// Collections nested inside each element.
    pub nested: &'static [NestedCollection],
}

/// A collection held by each element of a list, such as a vet's specialties.
#[derive(Debug)]
pub struct NestedCollection {
    /// The key on the parent element.
    pub key: &'static str,
    /// The shape of every nested element.
    pub element: &'static ResourceSchema,
    /// When set, a non-empty list must have at least one parent whose
    /// collection is populated.
    pub require_populated_parent: bool,
}

/// Why a response broke its schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaMismatch {
    /// The response was not a JSON array.
    #[error("expected a JSON array of {resource} records")]
    NotAnArray {
        /// The resource the list should hold.
        resource: &'static str,
    },

    /// An element was not a JSON object.
    #[error("{resource} at {path} is not an object")]
    NotAnObject {
        /// The resource the element should be.
        resource: &'static str,
        /// Where in the response the element is.
        path: String,
    },

    /// A required key was absent.
    #[error("{resource} at {path} is missing `{key}`")]
    MissingKey {
        /// The resource the element should be.
        resource: &'static str,
        /// Where in the response the element is.
        path: String,
        /// The absent key.
        key: &'static str,
    },

    /// A key that must hold a value was null.
    #[error("{resource} at {path} has a null `{key}`")]
    NullValue {
        /// The resource the element should be.
        resource: &'static str,
        /// Where in the response the element is.
        path: String,
        /// The null key.
        key: &'static str,
    },

    /// A key held the wrong type of value.
    #[error("{resource} at {path} has `{key}` that is not a(n) {expected}")]
    WrongKind {
        /// The resource the element should be.
        resource: &'static str,
        /// Where in the response the element is.
        path: String,
        /// The offending key.
        key: &'static str,
        /// The expected type.
        expected: JsonKind,
    },

    /// No parent element had a populated nested collection.
    #[error("no {parent} in the response has any `{key}`")]
    NoPopulatedParent {
        /// The parent resource.
        parent: &'static str,
        /// The nested collection key.
        key: &'static str,
    },
}

/// Required shape of `/api/customer/owners` elements.
pub const OWNER: ResourceSchema = ResourceSchema {
    name: "owner",
    required_keys: &["id", "firstName", "lastName", "pets"],
    non_null_keys: &["id", "firstName", "lastName"],
    kinds: &[
        ("id", JsonKind::Integer),
        ("firstName", JsonKind::String),
        ("lastName", JsonKind::String),
        ("pets", JsonKind::Array),
    ],
    nested: &[NestedCollection {
        key: "pets",
        element: &PET,
        require_populated_parent: false,
    }],
};

/// Required shape of a pet nested in an owner.
pub const PET: ResourceSchema = ResourceSchema {
    name: "pet",
    required_keys: &["id", "name"],
    non_null_keys: &["id", "name"],
    kinds: &[("id", JsonKind::Integer), ("name", JsonKind::String)],
    nested: &[],
};

/// Required shape of `/api/vet/vets` elements.
pub const VET: ResourceSchema = ResourceSchema {
    name: "vet",
    required_keys: &["id", "firstName", "lastName", "specialties", "nrOfSpecialties"],
    non_null_keys: &["id", "specialties", "nrOfSpecialties"],
    kinds: &[
        ("id", JsonKind::Integer),
        ("specialties", JsonKind::Array),
        ("nrOfSpecialties", JsonKind::Integer),
    ],
    nested: &[NestedCollection {
        key: "specialties",
        element: &SPECIALTY,
        require_populated_parent: true,
    }],
};

/// Required shape of a specialty nested in a vet.
pub const SPECIALTY: ResourceSchema = ResourceSchema {
    name: "specialty",
    required_keys: &["id", "name"],
    non_null_keys: &["id", "name"],
    kinds: &[("id", JsonKind::Integer), ("name", JsonKind::String)],
    nested: &[],
};

/// Required shape of visit list elements.
pub const VISIT: ResourceSchema = ResourceSchema {
    name: "visit",
    required_keys: &["id", "petId", "description"],
    non_null_keys: &["id", "petId"],
    kinds: &[("id", JsonKind::Integer), ("petId", JsonKind::Integer)],
    nested: &[],
};

/// Check that `value` is an array whose every element matches `schema`.
///
/// # Errors
/// Returns the first mismatch found.
pub fn check_collection(schema: &ResourceSchema, value: &Value) -> Result<(), SchemaMismatch> {
    check_array(schema, value, "$")
}

/// [`check_collection`] with a path prefix for failure messages.
fn check_array(schema: &ResourceSchema, value: &Value, path: &str) -> Result<(), SchemaMismatch> {
    let elements = value.as_array().ok_or(SchemaMismatch::NotAnArray {
        resource: schema.name,
    })?;

    for (idx, element) in elements.iter().enumerate() {
        check_element(schema, element, &format!("{}[{}]", path, idx))?;
    }

    for nested in schema.nested {
        let populated = elements.iter().any(|element| {
            element
                .get(nested.key)
                .and_then(Value::as_array)
                .map_or(false, |items| !items.is_empty())
        });
        if nested.require_populated_parent && !elements.is_empty() && !populated {
            return Err(SchemaMismatch::NoPopulatedParent {
                parent: schema.name,
                key: nested.key,
            });
        }
    }

    Ok(())
}

/// Check a single element, then recurse into its nested collections.
fn check_element(schema: &ResourceSchema, element: &Value, path: &str) -> Result<(), SchemaMismatch> {
    let object = element.as_object().ok_or_else(|| SchemaMismatch::NotAnObject {
        resource: schema.name,
        path: path.to_string(),
    })?;

    for &key in schema.required_keys.iter().chain(schema.non_null_keys) {
        if !object.contains_key(key) {
            return Err(SchemaMismatch::MissingKey {
                resource: schema.name,
                path: path.to_string(),
                key,
            });
        }
    }

    for &key in schema.non_null_keys {
        if object.get(key).map_or(true, Value::is_null) {
            return Err(SchemaMismatch::NullValue {
                resource: schema.name,
                path: path.to_string(),
                key,
            });
        }
    }

    for &(key, expected) in schema.kinds {
        match object.get(key) {
            Some(value) if !value.is_null() && !expected.matches(value) => {
                return Err(SchemaMismatch::WrongKind {
                    resource: schema.name,
                    path: path.to_string(),
                    key,
                    expected,
                });
            }
            _ => (),
        }
    }

    for nested in schema.nested {
        // Absent or null collections are covered by the parent's own keys.
        if let Some(items @ Value::Array(_)) = object.get(nested.key) {
            check_array(nested.element, items, &format!("{}.{}", path, nested.key))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_collection, JsonKind, SchemaMismatch, OWNER, VET};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vet(id: i64, specialties: serde_json::Value) -> serde_json::Value {
        let count = specialties.as_array().map_or(0, Vec::len);
        json!({
            "id": id,
            "firstName": "Helen",
            "lastName": "Leary",
            "specialties": specialties,
            "nrOfSpecialties": count,
        })
    }

    #[test]
    fn empty_owner_list_is_valid() {
        assert_eq!(check_collection(&OWNER, &json!([])), Ok(()));
    }

    #[test]
    fn vets_with_one_specialist_are_valid() {
        let vets = json!([
            vet(1, json!([])),
            vet(2, json!([{"id": 1, "name": "radiology"}])),
        ]);
        assert_eq!(check_collection(&VET, &vets), Ok(()));
    }

    #[test]
    fn object_instead_of_list_is_rejected() {
        assert_eq!(
            check_collection(&OWNER, &json!({"id": 1})),
            Err(SchemaMismatch::NotAnArray { resource: "owner" })
        );
    }

    #[test]
    fn every_element_is_checked_not_just_the_first() {
        let owners = json!([
            {"id": 1, "firstName": "George", "lastName": "Franklin", "pets": []},
            {"id": 2, "firstName": "Betty", "pets": []},
        ]);
        assert_eq!(
            check_collection(&OWNER, &owners),
            Err(SchemaMismatch::MissingKey {
                resource: "owner",
                path: "$[1]".to_string(),
                key: "lastName",
            })
        );
    }

    #[test]
    fn vets_without_any_specialty_are_rejected() {
        let vets = json!([vet(1, json!([])), vet(2, json!([]))]);
        assert_eq!(
            check_collection(&VET, &vets),
            Err(SchemaMismatch::NoPopulatedParent {
                parent: "vet",
                key: "specialties",
            })
        );
    }

    #[test]
    fn specialty_with_null_name_is_rejected() {
        let vets = json!([vet(3, json!([{"id": 2, "name": null}]))]);
        assert_eq!(
            check_collection(&VET, &vets),
            Err(SchemaMismatch::NullValue {
                resource: "specialty",
                path: "$[0].specialties[0]".to_string(),
                key: "name",
            })
        );
    }

    #[test]
    fn non_integer_specialty_count_is_rejected() {
        let mut bad = vet(4, json!([{"id": 2, "name": "surgery"}]));
        bad["nrOfSpecialties"] = json!("one");
        assert_eq!(
            check_collection(&VET, &json!([bad])),
            Err(SchemaMismatch::WrongKind {
                resource: "vet",
                path: "$[0]".to_string(),
                key: "nrOfSpecialties",
                expected: JsonKind::Integer,
            })
        );
    }

    #[test]
    fn nested_pets_are_checked() {
        let owners = json!([{
            "id": 1,
            "firstName": "Jean",
            "lastName": "Coleman",
            "pets": [{"id": 7, "name": "Samantha"}, {"id": 8}],
        }]);
        assert_eq!(
            check_collection(&OWNER, &owners),
            Err(SchemaMismatch::MissingKey {
                resource: "pet",
                path: "$[0].pets[1]".to_string(),
                key: "name",
            })
        );
    }
}

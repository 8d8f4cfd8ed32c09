//! # Pet Store wire types
//!
//! Data structures exchanged over HTTP by the Pet Store servers and consumed by
//! the OpenAPI agent. Field names follow the JSON wire format (`photoUrls`,
//! lowercase statuses) and all types round-trip through `serde`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Pet Store Core Types
// ============================================================================

/// Lifecycle status of a pet in the store.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    #[display("available")]
    Available,
    #[display("pending")]
    Pending,
    #[display("sold")]
    Sold,
}

/// A category a pet belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A free-form label attached to a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Tag {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A pet record. The `id` is chosen by the caller and is the store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    /// Serialized as `null` when absent.
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(rename = "photoUrls", default, deserialize_with = "null_as_empty")]
    pub photo_urls: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<Tag>,
    pub status: PetStatus,
}

impl Pet {
    /// Creates a pet with no category, photos or tags.
    pub fn new(id: i64, name: impl Into<String>, status: PetStatus) -> Self {
        Self {
            id,
            name: name.into(),
            category: None,
            photo_urls: Vec::new(),
            tags: Vec::new(),
            status,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn add_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_urls.push(url.into());
        self
    }

    pub fn add_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }
}

/// Reads an explicit `null` list the same as a missing one.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Count of pets per status. Statuses with no pets are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory(BTreeMap<PetStatus, u64>);

impl Inventory {
    /// Builds an inventory by counting the statuses of the given pets.
    pub fn tally<'a>(pets: impl IntoIterator<Item = &'a Pet>) -> Self {
        Self::from_statuses(pets.into_iter().map(|pet| pet.status))
    }

    pub fn from_statuses(statuses: impl IntoIterator<Item = PetStatus>) -> Self {
        let mut counts = BTreeMap::new();
        for status in statuses {
            *counts.entry(status).or_insert(0) += 1;
        }
        Self(counts)
    }

    /// Number of pets with the given status, zero when absent.
    pub fn count(&self, status: PetStatus) -> u64 {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PetStatus, &u64)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// OAuth2 Types
// ============================================================================

/// Successful response of the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Informational only; tokens are never expired by the server.
    pub expires_in: u64,
}

impl TokenResponse {
    pub fn bearer(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}

/// Error body of the token endpoint, e.g. `{"error": "invalid_grant"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuthErrorResponse {
    pub fn invalid_grant() -> Self {
        Self {
            error: "invalid_grant".to_string(),
            error_description: None,
        }
    }
}

/// What an authorization code was minted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    pub client_id: String,
    pub user: String,
}

/// Error body returned by the pet endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pet_defaults_optional_fields() {
        let pet: Pet = serde_json::from_value(json!({
            "id": 2,
            "name": "bird",
            "status": "available"
        }))
        .unwrap();

        assert_eq!(pet, Pet::new(2, "bird", PetStatus::Available));
    }

    #[test]
    fn test_pet_reads_null_lists_as_empty() {
        let pet: Pet = serde_json::from_value(json!({
            "id": 9,
            "name": "x",
            "status": "sold",
            "category": null,
            "tags": null,
            "photoUrls": null
        }))
        .unwrap();

        assert_eq!(pet, Pet::new(9, "x", PetStatus::Sold));
        assert_eq!(serde_json::to_value(&pet).unwrap()["photoUrls"], json!([]));
    }

    #[test]
    fn test_pet_uses_wire_field_names() {
        let pet = Pet::new(7, "rex", PetStatus::Sold).add_photo_url("https://example.com/rex.jpg");
        let value = serde_json::to_value(&pet).unwrap();

        assert_eq!(value["photoUrls"], json!(["https://example.com/rex.jpg"]));
        assert_eq!(value["status"], "sold");
        assert!(value["category"].is_null());
    }

    #[test]
    fn test_pet_rejects_unknown_status() {
        let result: Result<Pet, _> = serde_json::from_value(json!({
            "id": 1,
            "name": "x",
            "status": "lost"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_inventory_omits_missing_statuses() {
        let pets = vec![
            Pet::new(0, "a", PetStatus::Available),
            Pet::new(1, "b", PetStatus::Available),
            Pet::new(2, "c", PetStatus::Sold),
        ];
        let inventory = Inventory::tally(&pets);

        assert_eq!(inventory.count(PetStatus::Available), 2);
        assert_eq!(inventory.count(PetStatus::Pending), 0);
        assert_eq!(inventory.total(), 3);
        assert_eq!(
            serde_json::to_value(&inventory).unwrap(),
            json!({"available": 2, "sold": 1})
        );
    }

    #[test]
    fn test_token_response_shape() {
        let value = serde_json::to_value(TokenResponse::bearer("sat_abc", 3600)).unwrap();
        assert_eq!(
            value,
            json!({"access_token": "sat_abc", "token_type": "bearer", "expires_in": 3600})
        );
        assert_eq!(
            serde_json::to_value(OAuthErrorResponse::invalid_grant()).unwrap(),
            json!({"error": "invalid_grant"})
        );
    }
}

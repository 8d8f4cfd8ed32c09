use dashmap::{mapref::entry::Entry, DashMap};
use petstore_types::{Category, Inventory, Pet, PetStatus, Tag};

use crate::error::{ApiError, Result};

/// In-memory pet collection keyed by pet id.
///
/// Pets are never deleted. Create and replace each run under the shard lock
/// of their key, so a concurrent duplicate create cannot slip in between the
/// existence check and the insert.
#[derive(Debug, Default)]
pub struct PetStore {
    pets: DashMap<i64, Pet>,
}

impl PetStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the two demo pets every server starts with.
    pub fn seeded() -> Self {
        let store = Self::new();
        for pet in seed_pets() {
            store.pets.insert(pet.id, pet);
        }
        store
    }

    /// Inserts a new pet. Fails when the id is taken and leaves the store unchanged.
    pub fn create(&self, pet: Pet) -> Result<Pet> {
        match self.pets.entry(pet.id) {
            Entry::Occupied(_) => Err(ApiError::DuplicatePet { id: pet.id }),
            Entry::Vacant(slot) => {
                slot.insert(pet.clone());
                Ok(pet)
            }
        }
    }

    /// Overwrites an existing pet wholesale.
    pub fn replace(&self, pet: Pet) -> Result<Pet> {
        match self.pets.get_mut(&pet.id) {
            Some(mut existing) => {
                *existing = pet.clone();
                Ok(pet)
            }
            None => Err(ApiError::PetNotFound { id: pet.id }),
        }
    }

    pub fn get(&self, id: i64) -> Result<Pet> {
        self.pets
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ApiError::PetNotFound { id })
    }

    /// Counts pets per status by scanning the whole collection.
    pub fn inventory(&self) -> Inventory {
        Inventory::from_statuses(self.pets.iter().map(|entry| entry.value().status))
    }

    pub fn len(&self) -> usize {
        self.pets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pets.is_empty()
    }
}

fn seed_pets() -> Vec<Pet> {
    vec![
        Pet::new(0, "doggie", PetStatus::Available)
            .with_category(Category::new(6, "Dogs"))
            .add_photo_url("https://example.com/photo1.jpg")
            .add_photo_url("https://example.com/photo2.jpg")
            .add_tag(Tag::new(1, "friendly")),
        Pet::new(1, "cat", PetStatus::Pending)
            .with_category(Category::new(5, "Cats"))
            .add_photo_url("https://example.com/photo3.jpg")
            .add_tag(Tag::new(2, "playful")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_store() {
        let store = PetStore::seeded();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().name, "doggie");
        assert_eq!(store.get(1).unwrap().status, PetStatus::Pending);
    }

    #[test]
    fn test_duplicate_create_leaves_store_unchanged() {
        let store = PetStore::seeded();
        let impostor = Pet::new(0, "impostor", PetStatus::Sold);

        let err = store.create(impostor).unwrap_err();
        assert!(matches!(err, ApiError::DuplicatePet { id: 0 }));
        assert_eq!(store.get(0).unwrap().name, "doggie");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_replace_requires_existing_pet() {
        let store = PetStore::new();
        let err = store
            .replace(Pet::new(9, "ghost", PetStatus::Available))
            .unwrap_err();
        assert!(matches!(err, ApiError::PetNotFound { id: 9 }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_is_full_overwrite() {
        let store = PetStore::seeded();
        let replaced = store
            .replace(Pet::new(0, "doggie", PetStatus::Sold))
            .unwrap();

        let stored = store.get(0).unwrap();
        assert_eq!(stored, replaced);
        assert!(stored.category.is_none());
        assert!(stored.photo_urls.is_empty());
    }

    #[test]
    fn test_inventory_sums_to_store_size() {
        let store = PetStore::seeded();
        store
            .create(Pet::new(2, "bird", PetStatus::Available))
            .unwrap();

        let inventory = store.inventory();
        assert_eq!(inventory.count(PetStatus::Available), 2);
        assert_eq!(inventory.count(PetStatus::Pending), 1);
        assert_eq!(inventory.count(PetStatus::Sold), 0);
        assert_eq!(inventory.total(), store.len() as u64);
    }

    #[test]
    fn test_concurrent_duplicate_creates_admit_one() {
        let store = std::sync::Arc::new(PetStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .create(Pet::new(42, format!("racer-{i}"), PetStatus::Available))
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }
}

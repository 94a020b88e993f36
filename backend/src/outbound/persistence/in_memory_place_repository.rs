//! In-process place repository.
//!
//! Places live in an ordered map keyed by identifier, so listings come back
//! in creation order because identifiers are time-ordered.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{PlaceRepository, PlaceRepositoryError};
use crate::domain::{EntityId, Place};

/// [`PlaceRepository`] held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryPlaceRepository {
    places: RwLock<BTreeMap<EntityId, Place>>,
}

impl InMemoryPlaceRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `places`.
    pub fn with_places(places: impl IntoIterator<Item = Place>) -> Self {
        Self {
            places: RwLock::new(places.into_iter().map(|place| (place.id(), place)).collect()),
        }
    }
}

#[async_trait]
impl PlaceRepository for InMemoryPlaceRepository {
    async fn find(&self, id: &EntityId) -> Result<Place, PlaceRepositoryError> {
        self.places
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PlaceRepositoryError::not_found(id.to_string()))
    }

    async fn find_all(&self) -> Result<Vec<Place>, PlaceRepositoryError> {
        Ok(self.places.read().await.values().cloned().collect())
    }

    async fn create(&self, place: &Place) -> Result<EntityId, PlaceRepositoryError> {
        let mut places = self.places.write().await;
        if places.contains_key(&place.id()) {
            return Err(PlaceRepositoryError::query(format!(
                "place {} already exists",
                place.id()
            )));
        }
        places.insert(place.id(), place.clone());
        Ok(place.id())
    }

    async fn update(&self, place: &Place) -> Result<(), PlaceRepositoryError> {
        let mut places = self.places.write().await;
        let Some(slot) = places.get_mut(&place.id()) else {
            return Err(PlaceRepositoryError::not_found(place.id().to_string()));
        };
        *slot = place.clone();
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> Result<(), PlaceRepositoryError> {
        self.places
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PlaceRepositoryError::not_found(id.to_string()))
    }

    async fn search(&self, query: &str) -> Result<Vec<Place>, PlaceRepositoryError> {
        Ok(self
            .places
            .read()
            .await
            .values()
            .filter(|place| place.matches(query))
            .cloned()
            .collect())
    }
}

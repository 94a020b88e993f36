//! In-process category repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{CategoryRepository, CategoryRepositoryError};
use crate::domain::{Category, EntityId};

/// [`CategoryRepository`] held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryCategoryRepository {
    categories: RwLock<HashMap<EntityId, Category>>,
}

impl InMemoryCategoryRepository {
    /// Create a repository holding `categories`.
    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: RwLock::new(
                categories
                    .into_iter()
                    .map(|category| (category.id(), category))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find(&self, id: &EntityId) -> Result<Category, CategoryRepositoryError> {
        self.categories
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CategoryRepositoryError::not_found(id.to_string()))
    }

    /// Categories sorted by their display order, then name.
    async fn find_all(&self) -> Result<Vec<Category>, CategoryRepositoryError> {
        let mut categories: Vec<Category> =
            self.categories.read().await.values().cloned().collect();
        categories.sort_by(|a, b| {
            a.order()
                .cmp(&b.order())
                .then_with(|| a.name().cmp(b.name()))
        });
        Ok(categories)
    }

    async fn create(&self, category: &Category) -> Result<EntityId, CategoryRepositoryError> {
        let mut categories = self.categories.write().await;
        if categories.contains_key(&category.id()) {
            return Err(CategoryRepositoryError::query(format!(
                "category {} already exists",
                category.id()
            )));
        }
        categories.insert(category.id(), category.clone());
        Ok(category.id())
    }

    async fn update(&self, category: &Category) -> Result<(), CategoryRepositoryError> {
        let mut categories = self.categories.write().await;
        let Some(slot) = categories.get_mut(&category.id()) else {
            return Err(CategoryRepositoryError::not_found(
                category.id().to_string(),
            ));
        };
        *slot = category.clone();
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> Result<(), CategoryRepositoryError> {
        self.categories
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CategoryRepositoryError::not_found(id.to_string()))
    }
}

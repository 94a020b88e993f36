//! Driving port for category mutations.

use async_trait::async_trait;

use crate::domain::{CategoryDraft, EntityId, Error, RequestContext};

/// Use-case port for maintaining the category list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoriesCommand: Send + Sync {
    /// Create a category and return its identifier.
    async fn create(&self, ctx: &RequestContext, draft: CategoryDraft) -> Result<EntityId, Error>;

    /// Replace the fields of an existing category.
    async fn update(
        &self,
        ctx: &RequestContext,
        id: EntityId,
        draft: CategoryDraft,
    ) -> Result<(), Error>;

    /// Delete a category.
    async fn delete(&self, ctx: &RequestContext, id: EntityId) -> Result<(), Error>;
}

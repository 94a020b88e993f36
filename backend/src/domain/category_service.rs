//! Category domain service.
//!
//! Categories are plain reference data: mutations validate the draft and
//! write through the repository. They are not indexed, so nothing is
//! published to the broker.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{CategoriesCommand, CategoryRepository, CategoryRepositoryError};
use crate::domain::{Category, CategoryDraft, EntityId, Error, RequestContext};

pub(crate) fn map_category_error(error: CategoryRepositoryError) -> Error {
    match error {
        CategoryRepositoryError::NotFound { id } => {
            Error::not_found(format!("category {id} not found"))
        }
        CategoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("category repository unavailable: {message}"))
        }
        CategoryRepositoryError::Query { message } => {
            Error::internal(format!("category repository error: {message}"))
        }
    }
}

fn build_category(id: EntityId, draft: CategoryDraft) -> Result<Category, Error> {
    Category::new(id, draft.name, draft.order)
        .map_err(|err| Error::invalid_request(format!("invalid category: {err}")))
}

/// Refuse to start a write the caller has already given up on.
fn ensure_live(ctx: &RequestContext) -> Result<(), Error> {
    match ctx.err() {
        Some(reason) => Err(Error::service_unavailable(format!(
            "request abandoned: {reason}"
        ))),
        None => Ok(()),
    }
}

/// Category service implementing [`CategoriesCommand`].
#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    /// Create a service writing through `categories`.
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }
}

#[async_trait]
impl CategoriesCommand for CategoryService {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: CategoryDraft,
    ) -> Result<EntityId, Error> {
        let category = build_category(EntityId::generate(), draft)?;
        ensure_live(ctx)?;
        let id = self
            .categories
            .create(&category)
            .await
            .map_err(map_category_error)?;
        debug!(category_id = %id, "category created");
        Ok(id)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: EntityId,
        draft: CategoryDraft,
    ) -> Result<(), Error> {
        let category = build_category(id, draft)?;
        ensure_live(ctx)?;
        self.categories
            .update(&category)
            .await
            .map_err(map_category_error)
    }

    async fn delete(&self, ctx: &RequestContext, id: EntityId) -> Result<(), Error> {
        ensure_live(ctx)?;
        self.categories
            .delete(&id)
            .await
            .map_err(map_category_error)?;
        debug!(category_id = %id, "category deleted");
        Ok(())
    }
}

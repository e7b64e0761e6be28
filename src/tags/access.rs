use std::sync::Arc;
use uuid::Uuid;

use super::store::{NewTag, Tag, TagStore};
use crate::error::ApiError;

/// Owner-scoped mediator for the tag collection; the same shape as
/// `RecipeAccess`, reduced to the operations tags support.
pub struct TagAccess {
    store: Arc<dyn TagStore>,
}

impl TagAccess {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }

    async fn fetch_owned(&self, owner: Uuid, id: i64) -> Result<Tag, ApiError> {
        self.store.get(owner, id).await?.ok_or(ApiError::NotFound)
    }

    /// All tags owned by `owner`, name descending.
    pub async fn list(&self, owner: Uuid) -> Result<Vec<Tag>, ApiError> {
        Ok(self.store.list(owner).await?)
    }

    /// Creates a tag owned by `owner`; the name must be non-empty.
    pub async fn create(&self, owner: Uuid, name: &str) -> Result<Tag, ApiError> {
        if name.is_empty() {
            return Err(ApiError::Validation(vec!["name"]));
        }
        Ok(self
            .store
            .insert(NewTag {
                user_id: owner,
                name: name.to_string(),
            })
            .await?)
    }

    pub async fn rename(&self, owner: Uuid, id: i64, name: &str) -> Result<Tag, ApiError> {
        if name.is_empty() {
            return Err(ApiError::Validation(vec!["name"]));
        }
        self.fetch_owned(owner, id).await?;
        self.store
            .rename(owner, id, name)
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn delete(&self, owner: Uuid, id: i64) -> Result<(), ApiError> {
        self.fetch_owned(owner, id).await?;
        if self.store.delete(owner, id).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }
}

use bytes::Bytes;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::dto::RecipeInput;
use super::store::{NewRecipe, Recipe, RecipeStore};
use crate::error::ApiError;
use crate::images::{generate_path, ImageIdGen, ImageStore};

/// Mediates every operation against the recipe collection for one
/// authenticated owner. All reads and writes go through [`fetch_owned`] or an
/// owner-keyed store call, so a missing id and a foreign id are
/// indistinguishable (`NotFound` for both) and the owner column can never be
/// written after creation.
///
/// [`fetch_owned`]: RecipeAccess::fetch_owned
pub struct RecipeAccess {
    store: Arc<dyn RecipeStore>,
}

impl RecipeAccess {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }

    /// The single scope-to-owner primitive. Every id-addressed operation
    /// resolves the record through here first.
    async fn fetch_owned(&self, owner: Uuid, id: i64) -> Result<Recipe, ApiError> {
        self.store.get(owner, id).await?.ok_or(ApiError::NotFound)
    }

    /// All recipes owned by `owner`, newest first. Empty is not an error.
    pub async fn list(&self, owner: Uuid) -> Result<Vec<Recipe>, ApiError> {
        Ok(self.store.list(owner).await?)
    }

    pub async fn get(&self, owner: Uuid, id: i64) -> Result<Recipe, ApiError> {
        self.fetch_owned(owner, id).await
    }

    /// Creates a recipe owned by `owner`. Any `user` value in `input` is
    /// dropped; ownership is a server-side decision.
    pub async fn create(&self, owner: Uuid, input: RecipeInput) -> Result<Recipe, ApiError> {
        let new = validate_full(owner, input)?;
        Ok(self.store.insert(new).await?)
    }

    /// Partial update: only fields present in `patch` change; a `user` field
    /// is silently ignored and the original owner retained.
    pub async fn update(
        &self,
        owner: Uuid,
        id: i64,
        patch: RecipeInput,
    ) -> Result<Recipe, ApiError> {
        let current = self.fetch_owned(owner, id).await?;
        let merged = apply_patch(current, patch)?;
        self.store
            .update(owner, &merged)
            .await?
            .ok_or(ApiError::NotFound)
    }

    /// Full update: required fields must all be present, as on create.
    /// Optional fields absent from `input` keep their stored values; owner
    /// and image are always retained.
    pub async fn replace(
        &self,
        owner: Uuid,
        id: i64,
        input: RecipeInput,
    ) -> Result<Recipe, ApiError> {
        let current = self.fetch_owned(owner, id).await?;
        check_required(&input)?;
        let merged = apply_patch(current, input)?;
        self.store
            .update(owner, &merged)
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

    /// Stores an uploaded image under a freshly generated path and records the
    /// path on the recipe. Replacing an image removes the previous file.
    pub async fn set_image(
        &self,
        owner: Uuid,
        id: i64,
        original_filename: &str,
        body: Bytes,
        ids: &dyn ImageIdGen,
        files: &dyn ImageStore,
    ) -> Result<Recipe, ApiError> {
        let mut current = self.fetch_owned(owner, id).await?;
        let path = generate_path(ids, original_filename);
        files.put(&path, body).await?;
        let previous = current.image.replace(path.clone());
        match self.store.update(owner, &current).await? {
            Some(updated) => {
                if let Some(old) = previous {
                    if let Err(e) = files.delete(&old).await {
                        warn!(error = %e, path = %old, "failed to remove replaced image");
                    }
                }
                Ok(updated)
            }
            None => {
                // record vanished between the ownership check and the write;
                // don't leave the fresh file behind
                if let Err(e) = files.delete(&path).await {
                    warn!(error = %e, path = %path, "failed to remove orphaned image");
                }
                Err(ApiError::NotFound)
            }
        }
    }
}

/// Checks the required field set (create and replace): title non-empty,
/// time_minutes and price present and non-negative. Offending field names
/// are collected so the caller sees all problems at once.
fn check_required(input: &RecipeInput) -> Result<(), ApiError> {
    let mut bad = Vec::new();

    if !matches!(input.title.as_deref(), Some(t) if !t.is_empty()) {
        bad.push("title");
    }
    if !matches!(input.time_minutes, Some(m) if m >= 0) {
        bad.push("time_minutes");
    }
    if !matches!(input.price, Some(p) if p >= Decimal::ZERO) {
        bad.push("price");
    }

    if bad.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(bad))
    }
}

/// Validates a create payload. Optional fields default to empty.
fn validate_full(owner: Uuid, input: RecipeInput) -> Result<NewRecipe, ApiError> {
    check_required(&input)?;
    Ok(NewRecipe {
        user_id: owner,
        title: input.title.unwrap_or_default(),
        time_minutes: input.time_minutes.unwrap_or_default(),
        price: input.price.unwrap_or_default(),
        description: input.description.unwrap_or_default(),
        link: input.link.unwrap_or_default(),
    })
}

/// Applies a partial update to a stored recipe. Absent fields keep their
/// prior values; present fields are validated; `user` is dropped.
fn apply_patch(mut current: Recipe, patch: RecipeInput) -> Result<Recipe, ApiError> {
    let mut bad = Vec::new();

    if let Some(title) = patch.title {
        if title.is_empty() {
            bad.push("title");
        } else {
            current.title = title;
        }
    }
    if let Some(minutes) = patch.time_minutes {
        if minutes < 0 {
            bad.push("time_minutes");
        } else {
            current.time_minutes = minutes;
        }
    }
    if let Some(price) = patch.price {
        if price < Decimal::ZERO {
            bad.push("price");
        } else {
            current.price = price;
        }
    }
    if let Some(description) = patch.description {
        current.description = description;
    }
    if let Some(link) = patch.link {
        current.link = link;
    }

    if bad.is_empty() {
        Ok(current)
    } else {
        Err(ApiError::Validation(bad))
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

use super::store::Tag;

#[derive(Debug, Deserialize)]
pub struct TagInput {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
}

impl From<Tag> for TagResponse {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            name: t.name,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags", post(create_tag))
        .route("/tags/:id", patch(rename_tag))
        .route("/tags/:id", delete(delete_tag))
}

#[instrument(skip(state))]
pub async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = state.tag_access().list(user_id).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<TagInput>,
) -> Result<(StatusCode, Json<TagResponse>), ApiError> {
    let name = payload.name.unwrap_or_default();
    let tag = state.tag_access().create(user_id, &name).await?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

#[instrument(skip(state, payload))]
pub async fn rename_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<TagInput>,
) -> Result<Json<TagResponse>, ApiError> {
    let name = payload.name.unwrap_or_default();
    let tag = state.tag_access().rename(user_id, id, &name).await?;
    Ok(Json(tag.into()))
}

#[instrument(skip(state))]
pub async fn delete_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tag_access().delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

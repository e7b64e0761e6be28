use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

use super::dto::{RecipeDetail, RecipeImageResponse, RecipeInput, RecipeSummary};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/:id", patch(update_recipe))
        .route("/recipes/:id", put(replace_recipe))
        .route("/recipes/:id", delete(delete_recipe))
        .route("/recipes/:id/image", post(upload_image))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let recipes = state.recipe_access().list(user_id).await?;
    Ok(Json(recipes.into_iter().map(RecipeSummary::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let recipe = state.recipe_access().get(user_id, id).await?;
    Ok(Json(recipe.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecipeInput>,
) -> Result<(StatusCode, HeaderMap, Json<RecipeDetail>), ApiError> {
    let recipe = state.recipe_access().create(user_id, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/recipes/{}", recipe.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(recipe.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecipeInput>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let recipe = state.recipe_access().update(user_id, id, payload).await?;
    Ok(Json(recipe.into()))
}

#[instrument(skip(state, payload))]
pub async fn replace_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecipeInput>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let recipe = state.recipe_access().replace(user_id, id, payload).await?;
    Ok(Json(recipe.into()))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.recipe_access().delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/:id/image — multipart with a single `image` field.
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    mut mp: Multipart,
) -> Result<Json<RecipeImageResponse>, ApiError> {
    let mut upload = None;
    loop {
        match mp.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("image") {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::Internal(e.into()))?;
                    upload = Some((filename, data));
                }
            }
            Ok(None) => break,
            Err(e) => return Err(ApiError::Internal(e.into())),
        }
    }
    let Some((filename, data)) = upload else {
        return Err(ApiError::Validation(vec!["image"]));
    };
    if data.is_empty() {
        return Err(ApiError::Validation(vec!["image"]));
    }

    let recipe = state
        .recipe_access()
        .set_image(
            user_id,
            id,
            &filename,
            data,
            state.image_ids.as_ref(),
            state.images.as_ref(),
        )
        .await?;
    Ok(Json(RecipeImageResponse {
        id: recipe.id,
        image: recipe.image,
    }))
}

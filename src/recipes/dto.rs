use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::Recipe;

/// Incoming recipe fields, shared by create (POST), replace (PUT) and partial
/// update (PATCH). Which fields are required is decided by the access layer,
/// not by deserialization, so missing fields surface as a validation error
/// naming them. A `user` value is accepted here only so the access layer can
/// deliberately drop it.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeInput {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    /// Owner is never client-assignable; present-but-ignored.
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

/// List shape: everything but the description.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

/// Detail shape returned by get/create/update/replace.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub id: i64,
    pub image: Option<String>,
}

impl From<Recipe> for RecipeSummary {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            title: r.title,
            time_minutes: r.time_minutes,
            price: r.price,
            link: r.link,
        }
    }
}

impl From<Recipe> for RecipeDetail {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            time_minutes: r.time_minutes,
            price: r.price,
            description: r.description,
            link: r.link,
            image: r.image,
        }
    }
}

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Recipe record in the database. `user_id` is set once at creation and never
/// appears in an UPDATE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

/// A validated recipe ready to insert. Owner is already stamped by the access
/// layer.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: String,
}

/// Durable storage for recipes. Every read and mutation is keyed by owner, so
/// an implementation cannot answer for records the owner does not hold:
/// `get`/`update` return `None` and `delete` returns `false` for foreign ids
/// exactly as they do for missing ones.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn insert(&self, new: NewRecipe) -> anyhow::Result<Recipe>;

    /// Recipes owned by `owner`, newest first (descending id).
    async fn list(&self, owner: Uuid) -> anyhow::Result<Vec<Recipe>>;

    async fn get(&self, owner: Uuid, id: i64) -> anyhow::Result<Option<Recipe>>;

    /// Persists the mutable fields of `recipe`. Owner column is never written.
    async fn update(&self, owner: Uuid, recipe: &Recipe) -> anyhow::Result<Option<Recipe>>;

    async fn delete(&self, owner: Uuid, id: i64) -> anyhow::Result<bool>;
}

pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const RECIPE_COLUMNS: &str =
    "id, user_id, title, time_minutes, price, description, link, image, created_at";

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn insert(&self, new: NewRecipe) -> anyhow::Result<Recipe> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            INSERT INTO recipes (user_id, title, time_minutes, price, description, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RECIPE_COLUMNS}
            "#,
        ))
        .bind(new.user_id)
        .bind(&new.title)
        .bind(new.time_minutes)
        .bind(new.price)
        .bind(&new.description)
        .bind(&new.link)
        .fetch_one(&self.db)
        .await?;
        Ok(recipe)
    }

    async fn list(&self, owner: Uuid) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes
            WHERE user_id = $1
            ORDER BY id DESC
            "#,
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, owner: Uuid, id: i64) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes
            WHERE id = $1 AND user_id = $2
            "#,
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, owner: Uuid, recipe: &Recipe) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            UPDATE recipes
            SET title = $3, time_minutes = $4, price = $5,
                description = $6, link = $7, image = $8
            WHERE id = $1 AND user_id = $2
            RETURNING {RECIPE_COLUMNS}
            "#,
        ))
        .bind(recipe.id)
        .bind(owner)
        .bind(&recipe.title)
        .bind(recipe.time_minutes)
        .bind(recipe.price)
        .bind(&recipe.description)
        .bind(&recipe.link)
        .bind(&recipe.image)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, owner: Uuid, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM recipes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Tag record in the database; owned by exactly one user, like recipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTag {
    pub user_id: Uuid,
    pub name: String,
}

/// Same owner-keyed contract as the recipe store: foreign and missing ids are
/// indistinguishable to callers.
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn insert(&self, new: NewTag) -> anyhow::Result<Tag>;

    /// Tags owned by `owner`, name descending.
    async fn list(&self, owner: Uuid) -> anyhow::Result<Vec<Tag>>;

    async fn get(&self, owner: Uuid, id: i64) -> anyhow::Result<Option<Tag>>;

    async fn rename(&self, owner: Uuid, id: i64, name: &str) -> anyhow::Result<Option<Tag>>;

    async fn delete(&self, owner: Uuid, id: i64) -> anyhow::Result<bool>;
}

pub struct PgTagStore {
    db: PgPool,
}

impl PgTagStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn insert(&self, new: NewTag) -> anyhow::Result<Tag> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name, created_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.name)
        .fetch_one(&self.db)
        .await?;
        Ok(tag)
    }

    async fn list(&self, owner: Uuid) -> anyhow::Result<Vec<Tag>> {
        let rows = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, user_id, name, created_at
            FROM tags
            WHERE user_id = $1
            ORDER BY name DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, owner: Uuid, id: i64) -> anyhow::Result<Option<Tag>> {
        let row = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, user_id, name, created_at
            FROM tags
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn rename(&self, owner: Uuid, id: i64, name: &str) -> anyhow::Result<Option<Tag>> {
        let row = sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags
            SET name = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, created_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, owner: Uuid, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tags
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

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryTagStore {
        rows: Mutex<Vec<Tag>>,
        next_id: AtomicI64,
    }

    #[async_trait]
    impl TagStore for MemoryTagStore {
        async fn insert(&self, new: NewTag) -> anyhow::Result<Tag> {
            let tag = Tag {
                id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                user_id: new.user_id,
                name: new.name,
                created_at: OffsetDateTime::now_utc(),
            };
            self.rows.lock().unwrap().push(tag.clone());
            Ok(tag)
        }

        async fn list(&self, owner: Uuid) -> anyhow::Result<Vec<Tag>> {
            let mut rows: Vec<Tag> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.user_id == owner)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.name.cmp(&a.name));
            Ok(rows)
        }

        async fn get(&self, owner: Uuid, id: i64) -> anyhow::Result<Option<Tag>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == id && t.user_id == owner)
                .cloned())
        }

        async fn rename(&self, owner: Uuid, id: i64, name: &str) -> anyhow::Result<Option<Tag>> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|t| t.id == id && t.user_id == owner) {
                Some(tag) => {
                    tag.name = name.to_string();
                    Ok(Some(tag.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete(&self, owner: Uuid, id: i64) -> anyhow::Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|t| !(t.id == id && t.user_id == owner));
            Ok(rows.len() < before)
        }
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::error::ApiError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: OffsetDateTime,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Lower-cases only the domain portion (after the last `@`). Local-part
/// casing is significant per RFC 5321 and is preserved.
pub fn normalize_email(raw: &str) -> String {
    let raw = raw.trim();
    match raw.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => raw.to_string(),
    }
}

/// Account flag set, decided server-side at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserFlags {
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl UserFlags {
    pub fn regular() -> Self {
        Self {
            is_staff: false,
            is_superuser: false,
        }
    }

    pub fn superuser() -> Self {
        Self {
            is_staff: true,
            is_superuser: true,
        }
    }
}

/// Concurrent registrations can race past the pre-insert lookup; the unique
/// index on email is the backstop, surfaced as a conflict rather than a 500.
fn map_insert_error(e: sqlx::Error) -> ApiError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("Email already registered".into())
        }
        _ => e.into(),
    }
}

/// Normalizes and checks the one hard requirement: a non-empty email.
fn validated_email(raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(ApiError::Validation(vec!["email"]));
    }
    Ok(email)
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_staff, is_superuser, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_staff, is_superuser, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a regular user. Email is normalized first; an empty email is a
    /// validation error.
    pub async fn create(db: &PgPool, email: &str, password: &str) -> Result<User, ApiError> {
        Self::create_with_flags(db, email, password, UserFlags::regular()).await
    }

    /// Create a user with staff and superuser flags set.
    pub async fn create_superuser(
        db: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        Self::create_with_flags(db, email, password, UserFlags::superuser()).await
    }

    async fn create_with_flags(
        db: &PgPool,
        email: &str,
        password: &str,
        flags: UserFlags,
    ) -> Result<User, ApiError> {
        let email = validated_email(email)?;
        let password_hash = hash_password(password)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, is_staff, is_superuser, created_at
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .bind(flags.is_staff)
        .bind(flags.is_superuser)
        .fetch_one(db)
        .await
        .map_err(map_insert_error)?;
        Ok(user)
    }
}

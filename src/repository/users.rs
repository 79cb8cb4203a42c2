//! Users repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{User, UserRow},
};

use super::is_unique_violation;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Get user by ID
    async fn get_by_id(&self, id: i32) -> AppResult<User>;

    /// Get user with password hash by username (case insensitive)
    async fn get_by_username(&self, username: &str) -> AppResult<Option<UserRow>>;

    async fn exists(&self, id: i32) -> AppResult<bool>;

    /// Create an account. Fails with `Conflict` when the username is taken.
    async fn create(&self, username: &str, password_hash: &str, is_superuser: bool) -> AppResult<User>;

    async fn touch_last_login(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgUsersRepository {
    pool: Pool<Postgres>,
}

impl PgUsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, is_superuser, date_joined, last_login FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, is_superuser, date_joined, last_login
            FROM users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create(&self, username: &str, password_hash: &str, is_superuser: bool) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, is_superuser, date_joined)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, is_superuser, date_joined, last_login
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(is_superuser)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Username '{}' is already taken", username))
            } else {
                e.into()
            }
        })
    }

    async fn touch_last_login(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

//! Genres repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::genre::{Genre, GenreForm},
};

use super::is_unique_violation;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenresRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Genre>>;

    /// Create a genre. Fails with `Conflict` when the name is taken.
    async fn create(&self, genre: &GenreForm) -> AppResult<Genre>;
}

#[derive(Clone)]
pub struct PgGenresRepository {
    pool: Pool<Postgres>,
}

impl PgGenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenresRepository for PgGenresRepository {
    async fn list(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn create(&self, genre: &GenreForm) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("INSERT INTO genres (name) VALUES ($1) RETURNING id, name")
            .bind(genre.name.trim())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Genre '{}' already exists", genre.name.trim()))
                } else {
                    e.into()
                }
            })
    }
}

//! Books repository for database operations
//!
//! Create and update touch the book row and its genre links; both run in a
//! single transaction so readers never see a book with a half-applied genre
//! set, and an unknown genre label leaves nothing behind.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookForm, BookShort},
        book_instance::BookInstanceShort,
        genre::Genre,
        Page,
    },
};

use super::is_foreign_key_violation;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// List books ordered by title
    async fn list(&self, page: Page) -> AppResult<(Vec<BookShort>, i64)>;

    /// Get book by ID
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    /// Genres attached to a book, by name
    async fn genres_of(&self, id: i32) -> AppResult<Vec<Genre>>;

    /// Copies of a book
    async fn instances_of(&self, id: i32) -> AppResult<Vec<BookInstanceShort>>;

    /// Insert a book and attach the genres named in the form, atomically
    async fn create(&self, book: &BookForm) -> AppResult<Book>;

    /// Update a book and replace its genre set with the one in the form, atomically
    async fn update(&self, id: i32, book: &BookForm) -> AppResult<Book>;

    /// Delete a book. Fails with `ReferentialIntegrity` while copies reference it.
    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn count(&self) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Resolve every label to a genre or fail with the first unknown label
async fn resolve_genres(
    tx: &mut Transaction<'_, Postgres>,
    labels: &[String],
) -> AppResult<Vec<Genre>> {
    if labels.is_empty() {
        return Ok(Vec::new());
    }

    let found = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE name = ANY($1)")
        .bind(labels)
        .fetch_all(&mut **tx)
        .await?;

    if let Some(missing) = labels
        .iter()
        .find(|label| !found.iter().any(|g| &g.name == *label))
    {
        return Err(AppError::NotFound(format!("Genre '{}' not found", missing)));
    }

    Ok(found)
}

async fn attach_genres(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i32,
    genres: &[Genre],
) -> AppResult<()> {
    if genres.is_empty() {
        return Ok(());
    }

    let ids: Vec<i32> = genres.iter().map(|g| g.id).collect();
    sqlx::query(
        r#"
        INSERT INTO book_genres (book_id, genre_id)
        SELECT $1, UNNEST($2::int4[])
        "#,
    )
    .bind(book_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn unknown_author(e: sqlx::Error, author_id: i32) -> AppError {
    if is_foreign_key_violation(&e) {
        AppError::Validation(format!("Author with id {} does not exist", author_id))
    } else {
        e.into()
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn list(&self, page: Page) -> AppResult<(Vec<BookShort>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        let books = sqlx::query_as::<_, BookShort>(
            r#"
            SELECT b.id, b.title, b.isbn, b.author_id,
                   a.first_name || ' ' || a.last_name AS author_name
            FROM books b
            JOIN authors a ON a.id = b.author_id
            ORDER BY b.title, b.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, author_id, summary, isbn, book_image FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn genres_of(&self, id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    async fn instances_of(&self, id: i32) -> AppResult<Vec<BookInstanceShort>> {
        let instances = sqlx::query_as::<_, BookInstanceShort>(
            r#"
            SELECT id, status, due_back
            FROM book_instances
            WHERE book_id = $1
            ORDER BY status, due_back NULLS LAST, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    async fn create(&self, book: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, book_image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author_id, summary, isbn, book_image
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(&book.book_image)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unknown_author(e, book.author_id))?;

        let genres = resolve_genres(&mut tx, &book.genre_labels()).await?;
        attach_genres(&mut tx, created.id, &genres).await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, id: i32, book: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, summary = $3, isbn = $4, book_image = $5
            WHERE id = $6
            RETURNING id, title, author_id, summary, isbn, book_image
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(&book.book_image)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| unknown_author(e, book.author_id))?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let genres = resolve_genres(&mut tx, &book.genre_labels()).await?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        attach_genres(&mut tx, id, &genres).await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                Err(AppError::NotFound(format!("Book with id {} not found", id)))
            }
            Ok(_) => Ok(()),
            Err(e) if is_foreign_key_violation(&e) => Err(AppError::ReferentialIntegrity(format!(
                "Book {} is referenced by existing copies",
                id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

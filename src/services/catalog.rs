//! Catalog management service: books, genres and copies

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, BookForm, BookShort},
        book_instance::{BookInstanceDetails, InstanceForm},
        genre::{Genre, GenreForm},
        Page,
    },
    repository::Repository,
};

use super::{field_error, DeleteOutcome};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_books(&self, page: Page) -> AppResult<(Vec<BookShort>, i64)> {
        let (books, total) = self.repository.books.list(page).await?;
        page.ensure_exists(total)?;
        Ok((books, total))
    }

    /// Get a book with its author, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let author = self.repository.authors.get_by_id(book.author_id).await?;
        let genres = self.repository.books.genres_of(id).await?;
        let instances = self.repository.books.instances_of(id).await?;

        Ok(BookDetails {
            book,
            author,
            genres,
            instances,
        })
    }

    async fn validate_book(&self, form: &BookForm) -> AppResult<()> {
        form.validate()?;
        if !self.repository.authors.exists(form.author_id).await? {
            return Err(field_error(
                "author_id",
                "invalid_choice",
                format!("Author with id {} does not exist", form.author_id),
            ));
        }
        Ok(())
    }

    /// Create a book with its genre set; unknown genre labels fail the whole request
    pub async fn create_book(&self, form: BookForm) -> AppResult<Book> {
        self.validate_book(&form).await?;
        let book = self.repository.books.create(&form).await?;
        tracing::info!(
            "Created book id={} '{}' with genres {:?}",
            book.id,
            book.title,
            form.genre_labels()
        );
        Ok(book)
    }

    /// Update a book and replace its genre set with exactly the submitted one
    pub async fn update_book(&self, id: i32, form: BookForm) -> AppResult<Book> {
        self.validate_book(&form).await?;
        let book = self.repository.books.update(id, &form).await?;
        tracing::info!(
            "Updated book id={} with genres {:?}",
            book.id,
            form.genre_labels()
        );
        Ok(book)
    }

    /// Delete a book unless copies still reference it
    pub async fn delete_book(&self, id: i32) -> AppResult<DeleteOutcome<Book>> {
        let book = self.repository.books.get_by_id(id).await?;

        match self.repository.books.delete(id).await {
            Ok(()) => {
                tracing::info!("Deleted book id={}", id);
                Ok(DeleteOutcome::Deleted(book))
            }
            Err(AppError::ReferentialIntegrity(reason)) => {
                tracing::warn!("Book id={} not deleted: {}", id, reason);
                Ok(DeleteOutcome::Blocked(book))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, form: GenreForm) -> AppResult<Genre> {
        let form = GenreForm {
            name: form.name.trim().to_string(),
        };
        form.validate()?;
        match self.repository.genres.create(&form).await {
            Ok(genre) => {
                tracing::info!("Created genre '{}'", genre.name);
                Ok(genre)
            }
            Err(AppError::Conflict(message)) => Err(field_error("name", "unique", message)),
            Err(e) => Err(e),
        }
    }

    /// Add a copy of a book
    pub async fn create_instance(&self, book_id: i32, form: InstanceForm) -> AppResult<BookInstanceDetails> {
        form.validate()?;
        self.repository.books.get_by_id(book_id).await?;
        let instance = self
            .repository
            .instances
            .create(book_id, form.initial_status())
            .await?;
        tracing::info!("Added copy {} of book id={}", instance.id, book_id);
        Ok(instance)
    }
}

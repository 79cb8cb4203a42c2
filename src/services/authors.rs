//! Author management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetails, AuthorForm},
        Page,
    },
    repository::Repository,
};

use super::DeleteOutcome;

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_authors(&self, page: Page) -> AppResult<(Vec<Author>, i64)> {
        let (authors, total) = self.repository.authors.list(page).await?;
        page.ensure_exists(total)?;
        Ok((authors, total))
    }

    /// Get an author with the books referencing it
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.authors.books_of(id).await?;
        Ok(AuthorDetails { author, books })
    }

    pub async fn create_author(&self, form: AuthorForm) -> AppResult<Author> {
        form.validate()?;
        let author = self.repository.authors.create(&form).await?;
        tracing::info!("Created author id={} ({})", author.id, author.full_name());
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, form: AuthorForm) -> AppResult<Author> {
        form.validate()?;
        let author = self.repository.authors.update(id, &form).await?;
        tracing::info!("Updated author id={}", author.id);
        Ok(author)
    }

    /// Delete an author unless books still reference it
    pub async fn delete_author(&self, id: i32) -> AppResult<DeleteOutcome<Author>> {
        let author = self.repository.authors.get_by_id(id).await?;

        match self.repository.authors.delete(id).await {
            Ok(()) => {
                tracing::info!("Deleted author id={}", id);
                Ok(DeleteOutcome::Deleted(author))
            }
            Err(AppError::ReferentialIntegrity(reason)) => {
                tracing::warn!("Author id={} not deleted: {}", id, reason);
                Ok(DeleteOutcome::Blocked(author))
            }
            Err(e) => Err(e),
        }
    }
}

//! Data models for the Codex catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod user;

use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{AppError, AppResult};

// Re-export commonly used types
pub use author::{Author, AuthorDetails, AuthorForm};
pub use book::{Book, BookDetails, BookForm, BookShort};
pub use book_instance::{BookInstanceDetails, BookInstanceShort, LoanStatus};
pub use genre::{Genre, GenreForm};
pub use user::{User, UserClaims};

/// Page size of the loan-oriented instance lists
pub const INSTANCE_PAGE_SIZE: i64 = 10;
/// Default page size of the catalog lists
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Upper bound for a client-supplied page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 1
    pub page: Option<i64>,
    /// Items per page (catalog lists only)
    pub per_page: Option<i64>,
}

/// A validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    /// Page with a client-chosen size, clamped to `MAX_PAGE_SIZE`
    pub fn from_query(query: &PageQuery, default_size: i64) -> AppResult<Self> {
        let size = query.per_page.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE);
        Self::sized(query.page, size)
    }

    /// Page with a fixed size; any `per_page` is ignored
    pub fn fixed(query: &PageQuery, size: i64) -> AppResult<Self> {
        Self::sized(query.page, size)
    }

    fn sized(page: Option<i64>, size: i64) -> AppResult<Self> {
        let number = page.unwrap_or(1);
        if number < 1 {
            return Err(AppError::Validation("Page number must be at least 1".to_string()));
        }
        if (number - 1).checked_mul(size).is_none() {
            return Err(AppError::NotFound(format!("Invalid page ({})", number)));
        }
        Ok(Self { number, size })
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }

    /// Reject pages past the end; the first page of an empty list is valid
    pub fn ensure_exists(&self, total: i64) -> AppResult<()> {
        if self.number == 1 || self.offset() < total {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Invalid page ({})", self.number)))
        }
    }
}

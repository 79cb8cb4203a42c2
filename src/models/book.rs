//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{author::Author, book_instance::BookInstanceShort, genre::Genre};

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub summary: String,
    pub isbn: String,
    /// Cover image reference (URL or storage path)
    pub book_image: Option<String>,
}

/// Book as shown in lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub author_id: i32,
    pub author_name: String,
}

/// Book with author, genres and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author: Author,
    pub genres: Vec<Genre>,
    pub instances: Vec<BookInstanceShort>,
}

/// Create/update book form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub author_id: i32,
    #[validate(length(min = 1, max = 1000, message = "Summary must be 1-1000 characters"))]
    pub summary: String,
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: String,
    /// Genre labels; the book ends up with exactly this set
    #[serde(default)]
    pub genres: Vec<String>,
    #[validate(length(max = 255, message = "Image reference must be at most 255 characters"))]
    pub book_image: Option<String>,
}

impl BookForm {
    /// Submitted genre labels, trimmed like stored genre names, without
    /// duplicates, in submission order
    pub fn genre_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::with_capacity(self.genres.len());
        for genre in self.genres.iter().map(|g| g.trim()) {
            if !labels.iter().any(|l| l == genre) {
                labels.push(genre.to_string());
            }
        }
        labels
    }
}

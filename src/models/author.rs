//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::book::BookShort;

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
    /// Portrait image reference (URL or storage path)
    pub author_image: Option<String>,
}

impl Author {
    /// "First Last", as shown in messages
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Author with the books referencing it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    #[serde(flatten)]
    pub author: Author,
    pub books: Vec<BookShort>,
}

/// Create/update author form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_lifespan", skip_on_field_errors = false))]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
    #[validate(length(max = 255, message = "Image reference must be at most 255 characters"))]
    pub author_image: Option<String>,
}

fn validate_lifespan(form: &AuthorForm) -> Result<(), ValidationError> {
    match form.date_of_death {
        Some(death) if death < form.date_of_birth => {
            let mut error = ValidationError::new("date_of_death_before_birth");
            error.message = Some("Date of death cannot be before date of birth".into());
            Err(error)
        }
        _ => Ok(()),
    }
}

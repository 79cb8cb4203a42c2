//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Create genre form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GenreForm {
    #[validate(
        length(min = 1, max = 200, message = "Genre name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
}

fn validate_not_blank(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Genre name must not be blank".into());
        return Err(error);
    }
    Ok(())
}

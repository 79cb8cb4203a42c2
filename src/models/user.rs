//! User model, registration form and token claims

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::AppError;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

/// Public user representation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Internal row structure used for authentication (carries the password hash)
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            is_superuser: row.is_superuser,
            date_joined: row.date_joined,
            last_login: row.last_login,
        }
    }
}

/// Self-service registration form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegistrationForm {
    /// 150 characters or fewer. Letters, digits and @/./+/-/_ only.
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        regex(path = *USERNAME_RE, message = "Enter a valid username. Letters, digits and @/./+/-/_ only.")
    )]
    pub username: String,
    #[validate(
        length(min = 8, message = "This password is too short. It must contain at least 8 characters."),
        custom(function = "validate_not_numeric")
    )]
    pub password1: String,
    #[validate(must_match(other = "password1", message = "The two password fields didn't match."))]
    pub password2: String,
}

fn validate_not_numeric(password: &str) -> Result<(), ValidationError> {
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        let mut error = ValidationError::new("password_entirely_numeric");
        error.message = Some("This password is entirely numeric.".into());
        return Err(error);
    }
    Ok(())
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_superuser: bool,
    /// Session identifier minted at login; keys per-session state
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Require superuser privileges
    pub fn require_superuser(&self) -> Result<(), AppError> {
        if self.is_superuser {
            Ok(())
        } else {
            Err(AppError::Authorization("Superuser privileges required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(is_superuser: bool) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "librarian".into(),
            user_id: 7,
            is_superuser,
            sid: "3f1c".into(),
            exp: now + 3600,
            iat: now,
        }
    }

    fn registration(username: &str, password1: &str, password2: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.into(),
            password1: password1.into(),
            password2: password2.into(),
        }
    }

    #[test]
    fn token_round_trip() {
        let token = claims(true).create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, 7);
        assert!(decoded.is_superuser);
        assert_eq!(decoded.sid, "3f1c");
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = claims(false).create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn superuser_gate() {
        assert!(claims(true).require_superuser().is_ok());
        assert!(matches!(
            claims(false).require_superuser(),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn registration_accepts_valid_form() {
        assert!(registration("mary.shelley", "frankenstein", "frankenstein").validate().is_ok());
    }

    #[test]
    fn registration_rejects_mismatched_passwords() {
        let errors = registration("mary", "frankenstein", "prometheus").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password2"));
    }

    #[test]
    fn registration_rejects_short_or_numeric_passwords() {
        let errors = registration("mary", "short", "short").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password1"));

        let errors = registration("mary", "12345678", "12345678").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password1"));
    }

    #[test]
    fn registration_rejects_invalid_username_characters() {
        let errors = registration("mary shelley", "frankenstein", "frankenstein")
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }
}

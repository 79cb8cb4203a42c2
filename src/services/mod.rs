//! Business logic services

pub mod authors;
pub mod catalog;
pub mod loans;
pub mod redis;
pub mod stats;
pub mod users;

use std::sync::Arc;

use validator::{ValidationError, ValidationErrors};

use crate::{config::AuthConfig, error::AppError, repository::Repository};

use self::redis::SessionStore;

/// Result of a delete that may be blocked by references to the record
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome<T> {
    Deleted(T),
    /// Still referenced; nothing was changed
    Blocked(T),
}

/// Single-field form error, shaped like the derive-generated ones
pub(crate) fn field_error(field: &'static str, code: &'static str, message: String) -> AppError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    AppError::InvalidForm(errors)
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub stats: stats::StatsService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(repository: Repository, auth_config: AuthConfig, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            authors: authors::AuthorsService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            stats: stats::StatsService::new(repository.clone(), sessions),
            users: users::UsersService::new(repository, auth_config),
        }
    }
}

//! Dashboard statistics service

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::book_instance::LoanStatus, repository::Repository};

use super::redis::SessionStore;

/// Dashboard counters
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    /// Total number of books
    pub num_books: i64,
    /// Total number of copies
    pub num_instances: i64,
    /// Copies with status available
    pub num_instances_available: i64,
    /// Total number of authors
    pub num_authors: i64,
    /// Earlier visits to the dashboard in this session
    pub num_visits: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    sessions: Arc<dyn SessionStore>,
}

impl StatsService {
    pub fn new(repository: Repository, sessions: Arc<dyn SessionStore>) -> Self {
        Self { repository, sessions }
    }

    /// Catalog counters plus the session's visit count; records this visit
    pub async fn dashboard(&self, session_id: &str) -> AppResult<Dashboard> {
        let num_books = self.repository.books.count().await?;
        let num_instances = self.repository.instances.count().await?;
        let num_instances_available = self
            .repository
            .instances
            .count_with_status(LoanStatus::Available)
            .await?;
        let num_authors = self.repository.authors.count().await?;
        let num_visits = self.sessions.record_visit(session_id).await?;

        Ok(Dashboard {
            num_books,
            num_instances,
            num_instances_available,
            num_authors,
            num_visits,
        })
    }

    /// One round trip to the database
    pub async fn check_database(&self) -> AppResult<()> {
        self.repository.books.count().await.map(|_| ())
    }
}

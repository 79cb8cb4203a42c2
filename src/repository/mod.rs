//! Repository layer for database operations
//!
//! Each aggregate has a repository trait (the seam services are tested
//! against) and a PostgreSQL implementation over the shared pool.

pub mod authors;
pub mod books;
pub mod genres;
pub mod instances;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use authors::AuthorsRepository;
pub use books::BooksRepository;
pub use genres::GenresRepository;
pub use instances::InstancesRepository;
pub use users::UsersRepository;

/// Main repository struct holding one handle per aggregate
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorsRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub genres: Arc<dyn GenresRepository>,
    pub instances: Arc<dyn InstancesRepository>,
    pub users: Arc<dyn UsersRepository>,
}

impl Repository {
    /// Create PostgreSQL-backed repositories over the given pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(authors::PgAuthorsRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            genres: Arc::new(genres::PgGenresRepository::new(pool.clone())),
            instances: Arc::new(instances::PgInstancesRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool)),
        }
    }
}

/// True when the error is a PostgreSQL foreign-key violation
pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(e) if e.is_foreign_key_violation())
}

/// True when the error is a PostgreSQL unique-constraint violation
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(e) if e.is_unique_violation())
}

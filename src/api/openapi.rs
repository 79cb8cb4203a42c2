//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, dashboard, genres, health, instances};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Codex Catalog API",
        version = "0.3.0",
        description = "Local library catalog: books, authors, genres, copies and loans"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login_form,
        auth::login,
        auth::register,
        auth::me,
        // Dashboard
        dashboard::index,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::create_instance,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Genres
        genres::list_genres,
        genres::create_genre,
        // Instances
        instances::my_loans,
        instances::all_available,
        instances::get_instance,
        instances::loan_form,
        instances::loan_instance,
        instances::return_instance,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::LoginInstructions,
            auth::UserInfo,
            crate::models::user::RegistrationForm,
            // Dashboard
            crate::services::stats::Dashboard,
            // Books
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookDetails,
            crate::models::book::BookForm,
            // Authors
            crate::models::author::Author,
            crate::models::author::AuthorDetails,
            crate::models::author::AuthorForm,
            // Genres
            crate::models::genre::Genre,
            crate::models::genre::GenreForm,
            // Instances
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstanceShort,
            crate::models::book_instance::BookInstanceDetails,
            crate::models::book_instance::InstanceForm,
            crate::models::book_instance::LoanBookForm,
            crate::models::book_instance::LoanFormInitial,
            // Shared
            super::FlashRedirect,
            super::PaginatedBooks,
            super::PaginatedAuthors,
            super::PaginatedInstances,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, registration and current user"),
        (name = "dashboard", description = "Catalog counters"),
        (name = "books", description = "Book management"),
        (name = "authors", description = "Author management"),
        (name = "genres", description = "Genre management"),
        (name = "instances", description = "Book copies, loans and returns")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

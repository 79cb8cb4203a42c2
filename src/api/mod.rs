//! API handlers for the Codex catalog endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod dashboard;
pub mod genres;
pub mod health;
pub mod instances;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Named routes used as redirect targets
pub mod routes {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const AUTHOR_LIST: &str = "/api/v1/authors";
    pub const BOOK_LIST: &str = "/api/v1/books";
    pub const GENRE_LIST: &str = "/api/v1/genres";
    pub const ALL_AVAILABLE: &str = "/api/v1/instances/available";

    pub fn book_detail(id: i32) -> String {
        format!("{}/{}", BOOK_LIST, id)
    }

    pub fn author_detail(id: i32) -> String {
        format!("{}/{}", AUTHOR_LIST, id)
    }

    pub fn instance_detail(id: uuid::Uuid) -> String {
        format!("/api/v1/instances/{}", id)
    }
}

/// Extractor for authenticated user from JWT token
///
/// Missing, malformed and expired tokens all send the client to the login
/// endpoint.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::LoginRequired("Missing bearer token".to_string()))?;

        let claims = UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret)
            .map_err(|e| AppError::LoginRequired(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Outcome of a mutation: a message for the user and where to go next
#[derive(Debug, Serialize, ToSchema)]
pub struct FlashRedirect {
    pub message: String,
    pub location: String,
    /// Record created or changed by the mutation, when it has a detail route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl FlashRedirect {
    pub fn new(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: String) -> Self {
        self.resource = Some(resource);
        self
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let location = self.location.clone();
        (StatusCode::SEE_OTHER, [(header::LOCATION, location)], Json(self)).into_response()
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(
    PaginatedBooks = PaginatedResponse<crate::models::BookShort>,
    PaginatedAuthors = PaginatedResponse<crate::models::Author>,
    PaginatedInstances = PaginatedResponse<crate::models::BookInstanceDetails>
)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: crate::models::Page) -> Self {
        Self {
            items,
            total,
            page: page.number,
            per_page: page.size,
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", get(auth::login_form).post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/me", get(auth::me))
        // Dashboard
        .route("/dashboard", get(dashboard::index))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/books/:id/instances", post(books::create_instance))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Genres
        .route("/genres", get(genres::list_genres).post(genres::create_genre))
        // Book instances
        .route("/instances/mine", get(instances::my_loans))
        .route("/instances/available", get(instances::all_available))
        .route("/instances/:id", get(instances::get_instance))
        .route(
            "/instances/:id/loan",
            get(instances::loan_form).post(instances::loan_instance),
        )
        .route("/instances/:id/return", post(instances::return_instance))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

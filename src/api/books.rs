//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, BookForm},
        book_instance::InstanceForm,
        Page, PageQuery, DEFAULT_PAGE_SIZE,
    },
    services::DeleteOutcome,
    AppState,
};

use super::{routes, AuthenticatedUser, FlashRedirect, PaginatedBooks};

/// List books ordered by title
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "List of books", body = PaginatedBooks),
        (status = 303, description = "Not logged in; redirect to login"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedBooks>> {
    let page = Page::from_query(&query, DEFAULT_PAGE_SIZE)?;
    let (books, total) = state.services.catalog.list_books(page).await?;
    Ok(Json(PaginatedBooks::new(books, total, page)))
}

/// Get book details with author, genres and copies
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a book with its genres
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookForm,
    responses(
        (status = 303, description = "Book created; redirect to book list", body = FlashRedirect),
        (status = 400, description = "Form errors", body = crate::error::ErrorResponse),
        (status = 403, description = "Superuser required"),
        (status = 404, description = "Unknown genre")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<BookForm>,
) -> AppResult<FlashRedirect> {
    claims.require_superuser()?;

    let book = state.services.catalog.create_book(form).await?;
    Ok(FlashRedirect::new(
        format!("{} has been created", book.title),
        routes::BOOK_LIST,
    )
    .with_resource(routes::book_detail(book.id)))
}

/// Update a book and replace its genre set
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookForm,
    responses(
        (status = 303, description = "Book updated; redirect to book list", body = FlashRedirect),
        (status = 400, description = "Form errors", body = crate::error::ErrorResponse),
        (status = 403, description = "Superuser required"),
        (status = 404, description = "Book or genre not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<BookForm>,
) -> AppResult<FlashRedirect> {
    claims.require_superuser()?;

    let book = state.services.catalog.update_book(id, form).await?;
    Ok(FlashRedirect::new(
        format!("{} has been updated", book.title),
        routes::BOOK_LIST,
    )
    .with_resource(routes::book_detail(book.id)))
}

/// Delete a book unless copies of it exist
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 303, description = "Deleted or blocked; redirect to book list", body = FlashRedirect),
        (status = 403, description = "Superuser required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<FlashRedirect> {
    claims.require_superuser()?;

    let message = match state.services.catalog.delete_book(id).await? {
        DeleteOutcome::Deleted(book) => format!("{} has been deleted", book.title),
        DeleteOutcome::Blocked(book) => format!("{} cannot be deleted", book.title),
    };
    Ok(FlashRedirect::new(message, routes::BOOK_LIST))
}

/// Add a copy of a book
#[utoipa::path(
    post,
    path = "/books/{id}/instances",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = InstanceForm,
    responses(
        (status = 303, description = "Copy added; redirect to book detail", body = FlashRedirect),
        (status = 400, description = "Copies cannot start on loan"),
        (status = 403, description = "Superuser required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<InstanceForm>,
) -> AppResult<FlashRedirect> {
    claims.require_superuser()?;

    let instance = state.services.catalog.create_instance(id, form).await?;
    Ok(FlashRedirect::new(
        format!("Copy {} of {} added", instance.id, instance.book_title),
        routes::book_detail(id),
    )
    .with_resource(routes::instance_detail(instance.id)))
}

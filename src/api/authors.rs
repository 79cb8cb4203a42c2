//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        author::{AuthorDetails, AuthorForm},
        Page, PageQuery, DEFAULT_PAGE_SIZE,
    },
    services::DeleteOutcome,
    AppState,
};

use super::{routes, AuthenticatedUser, FlashRedirect, PaginatedAuthors};

/// List authors ordered by name
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "List of authors", body = PaginatedAuthors),
        (status = 303, description = "Not logged in; redirect to login"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedAuthors>> {
    let page = Page::from_query(&query, DEFAULT_PAGE_SIZE)?;
    let (authors, total) = state.services.authors.list_authors(page).await?;
    Ok(Json(PaginatedAuthors::new(authors, total, page)))
}

/// Get an author and their books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetails),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetails>> {
    let author = state.services.authors.get_author(id).await?;
    Ok(Json(author))
}

#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Author created; redirect to author list", body = FlashRedirect),
        (status = 400, description = "Form errors", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(form): Json<AuthorForm>,
) -> AppResult<FlashRedirect> {
    let author = state.services.authors.create_author(form).await?;
    Ok(FlashRedirect::new(
        format!("{} has been created", author.full_name()),
        routes::AUTHOR_LIST,
    )
    .with_resource(routes::author_detail(author.id)))
}

#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Author updated; redirect to author list", body = FlashRedirect),
        (status = 400, description = "Form errors", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<AuthorForm>,
) -> AppResult<FlashRedirect> {
    let author = state.services.authors.update_author(id, form).await?;
    Ok(FlashRedirect::new(
        format!("{} has been updated", author.full_name()),
        routes::AUTHOR_LIST,
    )
    .with_resource(routes::author_detail(author.id)))
}

/// Delete an author unless books reference them
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 303, description = "Deleted or blocked; redirect to author list", body = FlashRedirect),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<FlashRedirect> {
    let message = match state.services.authors.delete_author(id).await? {
        DeleteOutcome::Deleted(author) => format!("{} has been deleted", author.full_name()),
        DeleteOutcome::Blocked(author) => format!(
            "{} cannot be deleted. Books exist for this author",
            author.full_name()
        ),
    };
    Ok(FlashRedirect::new(message, routes::AUTHOR_LIST))
}

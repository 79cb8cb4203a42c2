//! Book instance endpoints: loan lists and the loan/return workflow

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BookInstanceDetails, LoanBookForm, LoanFormInitial},
        Page, PageQuery, INSTANCE_PAGE_SIZE,
    },
    AppState,
};

use super::{routes, AuthenticatedUser, FlashRedirect, PaginatedInstances};

/// Copies on loan to the caller, soonest due first
#[utoipa::path(
    get,
    path = "/instances/mine",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1, 10 per page)")
    ),
    responses(
        (status = 200, description = "Caller's loans", body = PaginatedInstances),
        (status = 303, description = "Not logged in; redirect to login"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn my_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedInstances>> {
    let page = Page::fixed(&query, INSTANCE_PAGE_SIZE)?;
    let (instances, total) = state.services.loans.loans_of(claims.user_id, page).await?;
    Ok(Json(PaginatedInstances::new(instances, total, page)))
}

/// Available copies ordered by book title
#[utoipa::path(
    get,
    path = "/instances/available",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1, 10 per page)")
    ),
    responses(
        (status = 200, description = "Available copies", body = PaginatedInstances),
        (status = 303, description = "Not logged in; redirect to login"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn all_available(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedInstances>> {
    let page = Page::fixed(&query, INSTANCE_PAGE_SIZE)?;
    let (instances, total) = state.services.loans.available(page).await?;
    Ok(Json(PaginatedInstances::new(instances, total, page)))
}

#[utoipa::path(
    get,
    path = "/instances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Book instance", body = BookInstanceDetails),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_instance(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    let instance = state.services.loans.get_instance(id).await?;
    Ok(Json(instance))
}

/// Loan form pre-filled from the copy
#[utoipa::path(
    get,
    path = "/instances/{id}/loan",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Pre-filled loan form", body = LoanFormInitial),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn loan_form(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LoanFormInitial>> {
    let initial = state.services.loans.loan_form(id).await?;
    Ok(Json(initial))
}

/// Loan an available copy for four weeks
#[utoipa::path(
    post,
    path = "/instances/{id}/loan",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = LoanBookForm,
    responses(
        (status = 303, description = "Loaned; redirect to available copies", body = FlashRedirect),
        (status = 400, description = "Unknown borrower", body = crate::error::ErrorResponse),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy is not available")
    )
)]
pub async fn loan_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(form): Json<LoanBookForm>,
) -> AppResult<FlashRedirect> {
    let loaned = state.services.loans.loan_instance(id, form).await?;
    tracing::debug!("Loan recorded by user id={}", claims.user_id);

    let due_back = loaned
        .due_back
        .map(|d| d.to_string())
        .unwrap_or_default();
    Ok(FlashRedirect::new(
        format!("{} is on loan until {}", loaned.book_title, due_back),
        routes::ALL_AVAILABLE,
    )
    .with_resource(routes::instance_detail(loaned.id)))
}

/// Return an on-loan copy
#[utoipa::path(
    post,
    path = "/instances/{id}/return",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 303, description = "Returned; redirect to available copies", body = FlashRedirect),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy is not on loan")
    )
)]
pub async fn return_instance(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<FlashRedirect> {
    let returned = state.services.loans.return_instance(id).await?;
    Ok(FlashRedirect::new(
        format!("{} has been returned", returned.book_title),
        routes::ALL_AVAILABLE,
    )
    .with_resource(routes::instance_detail(returned.id)))
}

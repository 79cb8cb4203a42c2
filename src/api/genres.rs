//! Genre endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::genre::{Genre, GenreForm},
    AppState,
};

use super::{routes, AuthenticatedUser, FlashRedirect};

#[utoipa::path(
    get,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All genres ordered by name", body = Vec<Genre>),
        (status = 303, description = "Not logged in; redirect to login")
    )
)]
pub async fn list_genres(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}

#[utoipa::path(
    post,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = GenreForm,
    responses(
        (status = 303, description = "Genre created; redirect to genre list", body = FlashRedirect),
        (status = 400, description = "Form errors", body = crate::error::ErrorResponse),
        (status = 403, description = "Superuser required")
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<GenreForm>,
) -> AppResult<FlashRedirect> {
    claims.require_superuser()?;

    let genre = state.services.catalog.create_genre(form).await?;
    Ok(FlashRedirect::new(
        format!("Genre {} has been created", genre.name),
        routes::GENRE_LIST,
    ))
}

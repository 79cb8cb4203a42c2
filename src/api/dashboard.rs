//! Dashboard endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, services::stats::Dashboard, AppState};

use super::AuthenticatedUser;

/// Catalog counters and this session's visit count
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counters", body = Dashboard),
        (status = 303, description = "Not logged in; redirect to login")
    )
)]
pub async fn index(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state.services.stats.dashboard(&claims.sid).await?;
    Ok(Json(dashboard))
}

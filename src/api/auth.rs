//! Authentication endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, models::user::RegistrationForm, AppState};

use super::{routes, AuthenticatedUser, FlashRedirect};

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// How to authenticate; target of every login redirect
#[derive(Serialize, ToSchema)]
pub struct LoginInstructions {
    pub message: String,
    /// Endpoint accepting the credentials
    pub login: String,
    /// Endpoint creating a new account
    pub register: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub is_superuser: bool,
}

/// Describe the login procedure
#[utoipa::path(
    get,
    path = "/auth/login",
    tag = "auth",
    responses(
        (status = 200, description = "Login instructions", body = LoginInstructions)
    )
)]
pub async fn login_form() -> Json<LoginInstructions> {
    Json(LoginInstructions {
        message: "Log in to see this page: POST your username and password".to_string(),
        login: routes::LOGIN.to_string(),
        register: routes::REGISTER.to_string(),
    })
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, _user) = state
        .services
        .users
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.services.users.token_lifetime(),
    }))
}

/// Create an account and redirect to login
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegistrationForm,
    responses(
        (status = 303, description = "Account created; redirect to login", body = FlashRedirect),
        (status = 400, description = "Form errors", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> AppResult<FlashRedirect> {
    let user = state.services.users.register(form).await?;
    Ok(FlashRedirect::new(
        format!("Account {} created. You can now log in.", user.username),
        routes::LOGIN,
    ))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 303, description = "Not logged in; redirect to login")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserInfo>> {
    let user = state.services.users.get_by_id(claims.user_id).await?;

    Ok(Json(UserInfo {
        id: user.id,
        username: user.username,
        is_superuser: user.is_superuser,
    }))
}

//! Registration, login and current-user handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::handlers::AppJson;
use crate::middleware::AuthUser;
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::server::AppState;
use crate::utils::errors::Result;
use crate::utils::logging::log_user_action;

pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.services.user_service.register(request).await?;
    log_user_action(user.id, "register", None);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let response = state.services.auth_service.login(request).await?;
    Ok(Json(response))
}

pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>> {
    let profile = state.services.user_service.get_user(user.user_id).await?;
    Ok(Json(profile))
}

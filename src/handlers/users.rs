//! User management handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::handlers::{AppJson, AppPath, AppQuery};
use crate::middleware::AuthUser;
use crate::models::pagination::{Page, PageQuery};
use crate::models::user::{UpdateUserRequest, User};
use crate::server::AppState;
use crate::utils::errors::Result;
use crate::utils::logging::{log_admin_action, log_user_action};

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Page<User>>> {
    user.require_admin()?;
    let page = state.services.user_service.list_users(&query).await?;
    Ok(Json(page))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<User>> {
    user.require_owner_or_admin(id)?;
    let found = state.services.user_service.get_user(id).await?;
    Ok(Json(found))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> Result<Json<User>> {
    user.require_owner_or_admin(id)?;

    let updated = state
        .services
        .user_service
        .update_user(id, request, user.is_admin())
        .await?;

    if user.user_id == id {
        log_user_action(user.user_id, "update_profile", None);
    } else {
        log_admin_action(user.user_id, "update_user", Some(&id.to_string()), None);
    }
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode> {
    user.require_admin()?;
    state.services.user_service.delete_user(id).await?;
    log_admin_action(user.user_id, "delete_user", Some(&id.to_string()), None);
    Ok(StatusCode::NO_CONTENT)
}

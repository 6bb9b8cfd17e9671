//! Benefit catalog handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::handlers::{AppJson, AppPath, AppQuery};
use crate::middleware::AuthUser;
use crate::models::benefit::{Benefit, CreateBenefitRequest, UpdateBenefitRequest};
use crate::models::pagination::{Page, PageQuery};
use crate::server::AppState;
use crate::utils::errors::Result;
use crate::utils::logging::log_admin_action;

fn is_admin(user: &Option<AuthUser>) -> bool {
    user.as_ref().is_some_and(|u| u.is_admin())
}

pub async fn list(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Page<Benefit>>> {
    let include_inactive = query.all && is_admin(&user);
    let page = state.services.benefit_service.list(&query, include_inactive).await?;
    Ok(Json(page))
}

pub async fn get(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Benefit>> {
    let benefit = state.services.benefit_service.get(id, is_admin(&user)).await?;
    Ok(Json(benefit))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreateBenefitRequest>,
) -> Result<(StatusCode, Json<Benefit>)> {
    user.require_admin()?;
    let benefit = state.services.benefit_service.create(request).await?;
    log_admin_action(user.user_id, "create_benefit", Some(&benefit.id.to_string()), None);
    Ok((StatusCode::CREATED, Json(benefit)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<UpdateBenefitRequest>,
) -> Result<Json<Benefit>> {
    user.require_admin()?;
    let benefit = state.services.benefit_service.update(id, request).await?;
    log_admin_action(user.user_id, "update_benefit", Some(&id.to_string()), None);
    Ok(Json(benefit))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode> {
    user.require_admin()?;
    state.services.benefit_service.delete(id).await?;
    log_admin_action(user.user_id, "delete_benefit", Some(&id.to_string()), None);
    Ok(StatusCode::NO_CONTENT)
}

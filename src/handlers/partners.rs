//! Partner directory handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::handlers::{AppJson, AppPath, AppQuery};
use crate::middleware::AuthUser;
use crate::models::pagination::{Page, PageQuery};
use crate::models::partner::{CreatePartnerRequest, Partner, UpdatePartnerRequest};
use crate::server::AppState;
use crate::services::PartnerDetails;
use crate::utils::errors::Result;
use crate::utils::logging::log_admin_action;

pub async fn list(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Page<Partner>>> {
    let include_inactive = query.all && user.is_some_and(|u| u.is_admin());
    let page = state.services.partner_service.list(&query, include_inactive).await?;
    Ok(Json(page))
}

/// Partner profile with its benefits
pub async fn get(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<PartnerDetails>> {
    let include_inactive = user.is_some_and(|u| u.is_admin());
    let details = state.services.partner_service.get(id, include_inactive).await?;
    Ok(Json(details))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreatePartnerRequest>,
) -> Result<(StatusCode, Json<Partner>)> {
    user.require_admin()?;
    let partner = state.services.partner_service.create(request).await?;
    log_admin_action(user.user_id, "create_partner", Some(&partner.id.to_string()), None);
    Ok((StatusCode::CREATED, Json(partner)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<UpdatePartnerRequest>,
) -> Result<Json<Partner>> {
    user.require_admin()?;
    let partner = state.services.partner_service.update(id, request).await?;
    log_admin_action(user.user_id, "update_partner", Some(&id.to_string()), None);
    Ok(Json(partner))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode> {
    user.require_admin()?;
    state.services.partner_service.delete(id).await?;
    log_admin_action(user.user_id, "delete_partner", Some(&id.to_string()), None);
    Ok(StatusCode::NO_CONTENT)
}

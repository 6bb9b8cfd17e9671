//! Payment handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::handlers::{AppJson, AppPath, AppQuery};
use crate::middleware::AuthUser;
use crate::models::pagination::{Page, PageQuery};
use crate::models::payment::{CreatePaymentRequest, Payment, UpdatePaymentRequest};
use crate::server::AppState;
use crate::utils::errors::Result;
use crate::utils::logging::log_admin_action;

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Page<Payment>>> {
    let page = state.services.payment_service.list(&query, &user).await?;
    Ok(Json(page))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Payment>> {
    let payment = state.services.payment_service.get(id, &user).await?;
    Ok(Json(payment))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    user.require_admin()?;
    let payment = state.services.payment_service.create(request).await?;
    log_admin_action(
        user.user_id,
        "create_payment",
        Some(&payment.id.to_string()),
        Some(&format!("user {} amount_cents {}", payment.user_id, payment.amount_cents)),
    );
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<UpdatePaymentRequest>,
) -> Result<Json<Payment>> {
    user.require_admin()?;
    let payment = state.services.payment_service.update(id, request).await?;
    log_admin_action(user.user_id, "update_payment", Some(&id.to_string()), None);
    Ok(Json(payment))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode> {
    user.require_admin()?;
    state.services.payment_service.delete(id).await?;
    log_admin_action(user.user_id, "delete_payment", Some(&id.to_string()), None);
    Ok(StatusCode::NO_CONTENT)
}

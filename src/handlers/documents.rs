//! Document upload and review handlers

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use crate::handlers::{AppJson, AppMultipart, AppPath, AppQuery};
use crate::middleware::AuthUser;
use crate::models::document::{Document, UpdateDocumentStatusRequest};
use crate::models::pagination::{Page, PageQuery};
use crate::server::AppState;
use crate::services::DocumentUpload;
use crate::utils::errors::{AscesaError, Result};
use crate::utils::logging::{log_admin_action, log_user_action};

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Page<Document>>> {
    let page = state.services.document_service.list(&query, &user).await?;
    Ok(Json(page))
}

/// Multipart upload with a `file` part and an optional `title` part
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<(StatusCode, Json<Document>)> {
    let mut title = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => title = Some(field.text().await?),
            Some("file") => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                file = Some((file_name, mime_type, bytes.to_vec()));
            }
            other => debug!(field = ?other, "Ignoring unexpected multipart field"),
        }
    }

    let (file_name, mime_type, bytes) =
        file.ok_or_else(|| AscesaError::InvalidInput("Missing file field".to_string()))?;

    let document = state
        .services
        .document_service
        .upload(
            user.user_id,
            DocumentUpload {
                title,
                file_name,
                mime_type,
                bytes,
            },
        )
        .await?;

    log_user_action(user.user_id, "upload_document", Some(&document.id.to_string()));
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Document>> {
    let document = state.services.document_service.get(id, &user).await?;
    Ok(Json(document))
}

pub async fn download(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<Response> {
    let (document, bytes) = state.services.document_service.download(id, &user).await?;

    let content_type = HeaderValue::from_str(&document.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    // file_name is sanitized on upload, so it is safe inside quotes
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", document.file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok(([(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)], bytes).into_response())
}

pub async fn set_status(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<UpdateDocumentStatusRequest>,
) -> Result<Json<Document>> {
    user.require_admin()?;
    let document = state.services.document_service.set_status(id, request.status).await?;
    log_admin_action(
        user.user_id,
        "review_document",
        Some(&id.to_string()),
        Some(&format!("{:?}", request.status)),
    );
    Ok(Json(document))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode> {
    state.services.document_service.delete(id, &user).await?;
    log_user_action(user.user_id, "delete_document", Some(&id.to_string()));
    Ok(StatusCode::NO_CONTENT)
}

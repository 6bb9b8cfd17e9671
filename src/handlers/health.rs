//! Health check handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::server::AppState;
use crate::services::ServiceHealthStatus;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub services: ServiceHealthStatus,
    pub unhealthy: Vec<&'static str>,
    pub rate_limit_keys: usize,
}

/// Liveness plus a database ping; 503 when the database is unreachable
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let services = state.services.health_check().await;
    let healthy = services.is_healthy();

    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: crate::VERSION,
        unhealthy: services.unhealthy_services(),
        services,
        rate_limit_keys: state.rate_limit.limiter().len(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

//! HTTP server wiring
//!
//! Application state and the router. Every API route sits behind the
//! per-client rate limiter; `/health` does not, so probes never eat into a
//! client's quota.
//!
//! The CORS layer is outermost so preflight requests are answered before
//! routing or rate limiting.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::Settings;
use crate::database::{DatabasePool, DatabaseService};
use crate::handlers::{auth, benefits, documents, health, partners, payments, users};
use crate::middleware::rate_limit::{enforce_rate_limit, RateLimitConfig, RateLimitMiddleware, RateLimiter};
use crate::middleware::{error_path, log_requests};
use crate::services::{AuthService, ServiceFactory};
use crate::utils::errors::AscesaError;

/// Room for multipart framing and the title field on top of the file itself
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceFactory>,
    pub rate_limit: RateLimitMiddleware,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings, pool: DatabasePool) -> Self {
        let services = ServiceFactory::new(&settings, DatabaseService::new(pool));

        let limiter = RateLimiter::new(RateLimitConfig {
            max_entries: settings.rate_limit.max_tracked_keys,
            ..RateLimitConfig::default()
        });
        let rate_limit = RateLimitMiddleware::new(Arc::new(limiter), settings.rate_limit.trust_forwarded_for);

        Self {
            services: Arc::new(services),
            rate_limit,
            settings: Arc::new(settings),
        }
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.services.auth_service.clone()
    }
}

/// CORS for the configured frontend origin, if any
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    let value = match HeaderValue::from_str(origin.trim_end_matches('/')) {
        Ok(value) => value,
        Err(e) => {
            warn!(origin = %origin, error = %e, "Ignoring unusable CORS origin");
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::exact(value))
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .max_age(Duration::from_secs(60 * 60)),
    )
}

async fn route_not_found() -> AscesaError {
    AscesaError::NotFound("Route".to_string())
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state
        .settings
        .uploads
        .max_file_size_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let upload_limit = usize::try_from(upload_limit).unwrap_or(usize::MAX);

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/users", get(users::list))
        .route("/users/{id}", get(users::get).patch(users::update).delete(users::delete))
        .route("/benefits", get(benefits::list).post(benefits::create))
        .route(
            "/benefits/{id}",
            get(benefits::get).patch(benefits::update).delete(benefits::delete),
        )
        .route("/partners", get(partners::list).post(partners::create))
        .route(
            "/partners/{id}",
            get(partners::get).patch(partners::update).delete(partners::delete),
        )
        .route(
            "/documents",
            get(documents::list)
                .post(documents::upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/documents/{id}", get(documents::get).delete(documents::delete))
        .route("/documents/{id}/download", get(documents::download))
        .route("/documents/{id}/status", patch(documents::set_status))
        .route("/payments", get(payments::list).post(payments::create))
        .route(
            "/payments/{id}",
            get(payments::get).patch(payments::update).delete(payments::delete),
        )
        .route_layer(from_fn_with_state(state.rate_limit.clone(), enforce_rate_limit));

    let cors = cors_layer(state.settings.server.cors_origin.as_deref());

    let router = Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .fallback(route_not_found)
        .layer(from_fn(error_path))
        .layer(from_fn(log_requests))
        .with_state(state);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

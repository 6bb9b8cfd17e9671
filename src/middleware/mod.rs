//! Middleware module
//!
//! This module contains middleware for request processing

pub mod auth;
pub mod logging;
pub mod rate_limit;

// Re-export commonly used middleware
pub use auth::AuthUser;
pub use logging::{error_path, log_requests};
pub use rate_limit::{enforce_rate_limit, RateLimitConfig, RateLimitMiddleware, RateLimiter};

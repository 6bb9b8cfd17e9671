//! ASCESA backend
//!
//! REST API for a membership association: member registration and login,
//! the partner and benefit catalog, document uploads with admin review, and
//! membership fee records. Requests are throttled per client and route by an
//! in-memory fixed-window rate limiter.

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{AscesaError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use server::{build_router, AppState};
pub use services::ServiceFactory;
pub use utils::{format_cpf, format_phone, validate_cpf};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}

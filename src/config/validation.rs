//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::services::auth::MAX_TOKEN_TTL_HOURS;
use crate::utils::errors::{AscesaError, Result};
use crate::utils::helpers::is_valid_http_url;

/// Minimum HS256 secret length in bytes
const MIN_JWT_SECRET_LEN: usize = 32;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_auth_config(&settings.auth)?;
    validate_upload_config(&settings.uploads)?;
    validate_rate_limit_settings(&settings.rate_limit)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(AscesaError::Config("Server host is required".to_string()));
    }

    if let Some(origin) = &config.cors_origin {
        if !is_valid_http_url(origin) {
            return Err(AscesaError::Config(format!("Invalid CORS origin: {}", origin)));
        }
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AscesaError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(AscesaError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(AscesaError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate token signing configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < MIN_JWT_SECRET_LEN {
        return Err(AscesaError::Config(format!(
            "JWT secret must be at least {} bytes",
            MIN_JWT_SECRET_LEN
        )));
    }

    if config.token_ttl_hours <= 0 {
        return Err(AscesaError::Config(
            "Token TTL must be greater than 0".to_string(),
        ));
    }

    if config.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
        return Err(AscesaError::Config(format!(
            "Token TTL cannot exceed {} hours",
            MAX_TOKEN_TTL_HOURS
        )));
    }

    Ok(())
}

/// Validate document upload configuration
fn validate_upload_config(config: &super::UploadConfig) -> Result<()> {
    if config.dir.is_empty() {
        return Err(AscesaError::Config("Upload directory is required".to_string()));
    }

    if config.max_file_size_bytes == 0 {
        return Err(AscesaError::Config(
            "Max upload size must be greater than 0".to_string(),
        ));
    }

    if config.allowed_mime_types.is_empty() {
        return Err(AscesaError::Config(
            "At least one allowed MIME type is required".to_string(),
        ));
    }

    Ok(())
}

fn validate_rate_limit_settings(config: &super::RateLimitSettings) -> Result<()> {
    if config.max_tracked_keys == 0 {
        return Err(AscesaError::Config(
            "Rate limiter capacity must be greater than 0".to_string(),
        ));
    }

    if config.sweep_interval_seconds == 0 {
        return Err(AscesaError::Config(
            "Rate limiter sweep interval must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(AscesaError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(AscesaError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

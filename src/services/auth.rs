//! Authentication service implementation
//!
//! This service handles password hashing, credential checks, and issuing and
//! verifying the bearer tokens carried by every authenticated request.

use std::sync::LazyLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::database::repositories::UserRepository;
use crate::models::user::{AuthResponse, LoginRequest, User, UserRole, UserStatus};
use crate::utils::errors::{AscesaError, Result};

/// Longest token lifetime accepted from configuration (one year)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Checked on logins for unknown emails so they cost the same Argon2 run as a wrong password
static DUMMY_PASSWORD_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_blocking("ascesa-unknown-account").ok());

fn hash_blocking(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_blocking(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: UserRole,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role.includes(UserRole::Admin)
    }

    /// Require the admin role
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            warn!(user_id = self.user_id, "Unauthorized admin access attempt");
            Err(AscesaError::PermissionDenied("Admin privileges required".to_string()))
        }
    }

    /// Allow the owner of a record or an admin
    pub fn require_owner_or_admin(&self, owner_id: i64) -> Result<()> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            warn!(user_id = self.user_id, owner_id = owner_id, "Access to another member's record denied");
            Err(AscesaError::PermissionDenied("Access denied".to_string()))
        }
    }

    /// Owner filter for listings: admins see everything
    pub fn owner_filter(&self) -> Option<i64> {
        if self.is_admin() {
            None
        } else {
            Some(self.user_id)
        }
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// Authentication service for credentials and tokens
#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(user_repository: UserRepository, config: &AuthConfig) -> Self {
        Self {
            user_repository,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: Duration::hours(config.token_ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS)),
        }
    }

    /// Hash a password with Argon2id and a fresh salt, off the async workers
    pub async fn hash_password(password: &str) -> Result<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hash_blocking(&password)).await?
    }

    /// Check a password against a stored PHC hash string, off the async workers
    pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let stored_hash = stored_hash.to_string();
        tokio::task::spawn_blocking(move || verify_blocking(&password, &stored_hash)).await?
    }

    /// Spend one Argon2 verification without a real account; always `false`
    pub async fn verify_unknown_account(password: &str) -> Result<bool> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || match DUMMY_PASSWORD_HASH.as_deref() {
            Some(hash) => verify_blocking(&password, hash).map(|_| false),
            None => Ok(false),
        })
        .await?
    }

    /// Sign a token for a user
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify signature and expiry of a bearer token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                AscesaError::Authentication("Invalid or expired token".to_string())
            })
    }

    /// Token lifetime in seconds
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl.num_seconds()
    }

    /// Check credentials and issue a token
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let email = request.email.trim();
        debug!(email = %email, "Login attempt");

        let user = match self.user_repository.find_by_email(email).await? {
            Some(user) => user,
            None => {
                if let Err(e) = Self::verify_unknown_account(&request.password).await {
                    debug!(error = %e, "Dummy password check failed");
                }
                warn!(email = %email, "Login failed: unknown email");
                return Err(invalid_credentials());
            }
        };

        if !Self::verify_password(&request.password, &user.password_hash).await? {
            warn!(user_id = user.id, "Login failed: wrong password");
            return Err(invalid_credentials());
        }

        if user.status == UserStatus::Inactive {
            warn!(user_id = user.id, "Login refused: account inactive");
            return Err(AscesaError::PermissionDenied("Account is inactive".to_string()));
        }

        let access_token = self.issue_token(&user)?;
        info!(user_id = user.id, role = user.role.as_str(), "User logged in");

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_ttl_seconds(),
            user,
        })
    }
}

fn invalid_credentials() -> AscesaError {
    AscesaError::Authentication("Invalid email or password".to_string())
}

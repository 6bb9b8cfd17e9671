//! User service implementation
//!
//! This service handles member registration, profile management, and the
//! admin-side user listing. Registration records are validated here before
//! anything reaches the database, including the CPF check digits.

use tracing::{debug, info, warn};

use crate::database::repositories::UserRepository;
use crate::models::pagination::{Page, PageQuery};
use crate::models::user::{
    CreateUserRequest, RegisterRequest, UpdateUserRequest, User, UserRole, UserStatus,
};
use crate::services::auth::AuthService;
use crate::services::storage::FileStorage;
use crate::utils::cpf::{normalize_cpf, strip_non_digits};
use crate::utils::errors::{AscesaError, Result};
use crate::utils::helpers::{is_valid_email, is_valid_phone, normalize_whitespace};

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// Registration fields after validation and normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone: Option<String>,
}

/// Validate and normalize a sign-up payload
pub fn validate_registration(request: &RegisterRequest) -> Result<ValidatedRegistration> {
    let name = normalize_whitespace(&request.name);
    if name.is_empty() {
        return Err(AscesaError::InvalidInput("Name is required".to_string()));
    }

    let email = normalize_email(&request.email)?;

    let cpf = normalize_cpf(&request.cpf)
        .ok_or_else(|| AscesaError::InvalidInput("Invalid CPF".to_string()))?;

    let phone = normalize_phone(request.phone.as_deref())?;

    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AscesaError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(ValidatedRegistration {
        name,
        email,
        cpf,
        phone,
    })
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AscesaError::InvalidInput("Invalid email address".to_string()));
    }
    Ok(email)
}

fn normalize_phone(phone: Option<&str>) -> Result<Option<String>> {
    match phone.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(None),
        Some(p) if is_valid_phone(p) => Ok(Some(strip_non_digits(p))),
        Some(_) => Err(AscesaError::InvalidInput("Invalid phone number".to_string())),
    }
}

/// User service for managing user operations
#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
    storage: FileStorage,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(user_repository: UserRepository, storage: FileStorage) -> Self {
        Self {
            user_repository,
            storage,
        }
    }

    /// Register a new member
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let validated = validate_registration(&request)?;
        debug!(email = %validated.email, "Registering new member");

        if self.user_repository.find_by_email(&validated.email).await?.is_some() {
            warn!(email = %validated.email, "Registration rejected: email in use");
            return Err(AscesaError::Conflict("Email already registered".to_string()));
        }

        if self.user_repository.find_by_cpf(&validated.cpf).await?.is_some() {
            warn!("Registration rejected: CPF in use");
            return Err(AscesaError::Conflict("CPF already registered".to_string()));
        }

        let password_hash = AuthService::hash_password(&request.password).await?;

        let user = self
            .user_repository
            .create(CreateUserRequest {
                name: validated.name,
                email: validated.email,
                cpf: validated.cpf,
                phone: validated.phone,
                password_hash,
                role: UserRole::Member,
                status: UserStatus::Pending,
            })
            .await?;

        info!(user_id = user.id, "New member registered successfully");
        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        debug!(user_id = user_id, "Getting user by ID");
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AscesaError::NotFound("User".to_string()))
    }

    /// Update a profile. Role, status and CPF changes require `allow_privileged`.
    pub async fn update_user(
        &self,
        user_id: i64,
        mut request: UpdateUserRequest,
        allow_privileged: bool,
    ) -> Result<User> {
        debug!(user_id = user_id, "Updating user profile");

        if !allow_privileged
            && (request.role.is_some() || request.status.is_some() || request.cpf.is_some())
        {
            return Err(AscesaError::PermissionDenied(
                "Only administrators can change role, status or CPF".to_string(),
            ));
        }

        if let Some(name) = request.name.take() {
            let name = normalize_whitespace(&name);
            if name.is_empty() {
                return Err(AscesaError::InvalidInput("Name cannot be empty".to_string()));
            }
            request.name = Some(name);
        }

        if let Some(email) = request.email.take() {
            request.email = Some(normalize_email(&email)?);
        }

        if let Some(phone) = request.phone.take() {
            request.phone = normalize_phone(Some(&phone))?;
        }

        if let Some(cpf) = request.cpf.take() {
            let cpf = normalize_cpf(&cpf)
                .ok_or_else(|| AscesaError::InvalidInput("Invalid CPF".to_string()))?;
            if let Some(existing) = self.user_repository.find_by_cpf(&cpf).await? {
                if existing.id != user_id {
                    warn!(user_id = user_id, "CPF update rejected: CPF in use");
                    return Err(AscesaError::Conflict("CPF already registered".to_string()));
                }
            }
            request.cpf = Some(cpf);
        }

        let user = self
            .user_repository
            .update(user_id, request)
            .await?
            .ok_or_else(|| AscesaError::NotFound("User".to_string()))?;

        info!(user_id = user_id, "User profile updated successfully");
        Ok(user)
    }

    /// Delete a user with their documents, payments and uploaded files
    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        let stored_names = self
            .user_repository
            .delete_with_documents(user_id)
            .await?
            .ok_or_else(|| AscesaError::NotFound("User".to_string()))?;

        let removed = self.storage.discard_all(&stored_names).await;
        warn!(
            user_id = user_id,
            documents = stored_names.len(),
            files_removed = removed,
            "User deleted"
        );
        Ok(())
    }

    /// List users with pagination
    pub async fn list_users(&self, query: &PageQuery) -> Result<Page<User>> {
        debug!(page = query.page(), limit = query.limit(), "Listing users with pagination");

        let users = self.user_repository.list(query.limit(), query.offset()).await?;
        let total = self.user_repository.count().await?;

        Ok(Page::new(users, total, query))
    }
}

//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod benefit;
pub mod document;
pub mod partner;
pub mod payment;
pub mod storage;
pub mod user;

// Re-export commonly used services
pub use auth::{AuthContext, AuthService, Claims};
pub use benefit::BenefitService;
pub use document::{DocumentService, DocumentUpload};
pub use partner::{PartnerDetails, PartnerService};
pub use payment::PaymentService;
pub use storage::FileStorage;
pub use user::UserService;

use serde::Serialize;

use crate::config::settings::Settings;
use crate::database::DatabaseService;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub partner_service: PartnerService,
    pub benefit_service: BenefitService,
    pub document_service: DocumentService,
    pub payment_service: PaymentService,
    pub storage: FileStorage,
    database: DatabaseService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, database: DatabaseService) -> Self {
        let storage = FileStorage::new(&settings.uploads.dir);

        Self {
            auth_service: AuthService::new(database.users.clone(), &settings.auth),
            user_service: UserService::new(database.users.clone(), storage.clone()),
            partner_service: PartnerService::new(database.partners.clone(), database.benefits.clone()),
            benefit_service: BenefitService::new(database.benefits.clone(), database.partners.clone()),
            document_service: DocumentService::new(
                database.documents.clone(),
                storage.clone(),
                settings.uploads.clone(),
            ),
            payment_service: PaymentService::new(database.payments.clone(), database.users.clone()),
            storage,
            database,
        }
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = self.database.health_check().await.is_ok();
        let storage_ready = tokio::fs::metadata(self.storage.root())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        ServiceHealthStatus {
            database_healthy,
            storage_ready,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub storage_ready: bool,
}

impl ServiceHealthStatus {
    /// The database is the only hard dependency
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    /// Get list of unhealthy services
    pub fn unhealthy_services(&self) -> Vec<&'static str> {
        let mut unhealthy = Vec::new();
        if !self.database_healthy {
            unhealthy.push("database");
        }
        if !self.storage_ready {
            unhealthy.push("storage");
        }
        unhealthy
    }
}

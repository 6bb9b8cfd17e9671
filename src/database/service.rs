//! Database service layer
//!
//! This module bundles the repositories over one shared pool

use crate::database::{
    connection, BenefitRepository, DatabasePool, DocumentRepository, PartnerRepository,
    PaymentRepository, UserRepository,
};
use crate::utils::errors::AscesaError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub partners: PartnerRepository,
    pub benefits: BenefitRepository,
    pub documents: DocumentRepository,
    pub payments: PaymentRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            partners: PartnerRepository::new(pool.clone()),
            benefits: BenefitRepository::new(pool.clone()),
            documents: DocumentRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            pool,
        }
    }

    /// Ping the database
    pub async fn health_check(&self) -> Result<(), AscesaError> {
        connection::health_check(&self.pool).await
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

//! Benefit service implementation

use tracing::{debug, info};

use crate::database::repositories::{BenefitRepository, PartnerRepository};
use crate::models::benefit::{Benefit, CreateBenefitRequest, UpdateBenefitRequest};
use crate::models::pagination::{Page, PageQuery};
use crate::utils::errors::{AscesaError, Result};
use crate::utils::helpers::normalize_whitespace;

#[derive(Clone)]
pub struct BenefitService {
    benefit_repository: BenefitRepository,
    partner_repository: PartnerRepository,
}

impl BenefitService {
    pub fn new(benefit_repository: BenefitRepository, partner_repository: PartnerRepository) -> Self {
        Self {
            benefit_repository,
            partner_repository,
        }
    }

    async fn ensure_partner_exists(&self, partner_id: Option<i64>) -> Result<()> {
        if let Some(id) = partner_id {
            if self.partner_repository.find_by_id(id).await?.is_none() {
                return Err(AscesaError::InvalidInput(format!("Partner {} does not exist", id)));
            }
        }
        Ok(())
    }

    pub async fn create(&self, mut request: CreateBenefitRequest) -> Result<Benefit> {
        request.title = normalize_whitespace(&request.title);
        if request.title.is_empty() {
            return Err(AscesaError::InvalidInput("Benefit title is required".to_string()));
        }
        self.ensure_partner_exists(request.partner_id).await?;

        let benefit = self.benefit_repository.create(request).await?;
        info!(benefit_id = benefit.id, partner_id = ?benefit.partner_id, "Benefit created");
        Ok(benefit)
    }

    /// Get an active benefit; inactive ones only for admins
    pub async fn get(&self, id: i64, include_inactive: bool) -> Result<Benefit> {
        self.benefit_repository
            .find_by_id(id)
            .await?
            .filter(|b| include_inactive || b.is_active)
            .ok_or_else(|| AscesaError::NotFound("Benefit".to_string()))
    }

    pub async fn update(&self, id: i64, mut request: UpdateBenefitRequest) -> Result<Benefit> {
        if let Some(title) = request.title.take() {
            let title = normalize_whitespace(&title);
            if title.is_empty() {
                return Err(AscesaError::InvalidInput("Benefit title cannot be empty".to_string()));
            }
            request.title = Some(title);
        }
        self.ensure_partner_exists(request.partner_id).await?;

        let benefit = self
            .benefit_repository
            .update(id, request)
            .await?
            .ok_or_else(|| AscesaError::NotFound("Benefit".to_string()))?;

        info!(benefit_id = id, "Benefit updated");
        Ok(benefit)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.benefit_repository.delete(id).await? {
            return Err(AscesaError::NotFound("Benefit".to_string()));
        }
        info!(benefit_id = id, "Benefit deleted");
        Ok(())
    }

    pub async fn list(&self, query: &PageQuery, include_inactive: bool) -> Result<Page<Benefit>> {
        debug!(include_inactive = include_inactive, "Listing benefits");

        let benefits = self
            .benefit_repository
            .list(include_inactive, query.limit(), query.offset())
            .await?;
        let total = self.benefit_repository.count(include_inactive).await?;

        Ok(Page::new(benefits, total, query))
    }
}

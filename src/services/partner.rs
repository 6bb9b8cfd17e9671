//! Partner service implementation

use tracing::{debug, info};

use crate::database::repositories::{BenefitRepository, PartnerRepository};
use crate::models::benefit::Benefit;
use crate::models::pagination::{Page, PageQuery};
use crate::models::partner::{CreatePartnerRequest, Partner, UpdatePartnerRequest};
use crate::utils::errors::{AscesaError, Result};
use crate::utils::helpers::{is_valid_http_url, normalize_whitespace};

/// Partner together with the benefits it currently offers
#[derive(Debug, Clone, serde::Serialize)]
pub struct PartnerDetails {
    #[serde(flatten)]
    pub partner: Partner,
    pub benefits: Vec<Benefit>,
}

fn check_urls(website: Option<&str>, logo_url: Option<&str>) -> Result<()> {
    for (field, value) in [("website", website), ("logo_url", logo_url)] {
        if let Some(url) = value {
            if !is_valid_http_url(url) {
                return Err(AscesaError::InvalidInput(format!("Invalid {}: {}", field, url)));
            }
        }
    }
    Ok(())
}

/// Validate a new partner record
pub fn validate_new_partner(request: &mut CreatePartnerRequest) -> Result<()> {
    request.name = normalize_whitespace(&request.name);
    if request.name.is_empty() {
        return Err(AscesaError::InvalidInput("Partner name is required".to_string()));
    }
    check_urls(request.website.as_deref(), request.logo_url.as_deref())
}

#[derive(Clone)]
pub struct PartnerService {
    partner_repository: PartnerRepository,
    benefit_repository: BenefitRepository,
}

impl PartnerService {
    pub fn new(partner_repository: PartnerRepository, benefit_repository: BenefitRepository) -> Self {
        Self {
            partner_repository,
            benefit_repository,
        }
    }

    pub async fn create(&self, mut request: CreatePartnerRequest) -> Result<Partner> {
        validate_new_partner(&mut request)?;

        let partner = self.partner_repository.create(request).await?;
        info!(partner_id = partner.id, "Partner created");
        Ok(partner)
    }

    /// Get an active partner with its benefits; inactive partners only for admins
    pub async fn get(&self, id: i64, include_inactive: bool) -> Result<PartnerDetails> {
        let partner = self
            .partner_repository
            .find_by_id(id)
            .await?
            .filter(|p| include_inactive || p.is_active)
            .ok_or_else(|| AscesaError::NotFound("Partner".to_string()))?;

        let benefits = self.benefit_repository.find_by_partner(id).await?;
        Ok(PartnerDetails { partner, benefits })
    }

    pub async fn update(&self, id: i64, mut request: UpdatePartnerRequest) -> Result<Partner> {
        if let Some(name) = request.name.take() {
            let name = normalize_whitespace(&name);
            if name.is_empty() {
                return Err(AscesaError::InvalidInput("Partner name cannot be empty".to_string()));
            }
            request.name = Some(name);
        }
        check_urls(request.website.as_deref(), request.logo_url.as_deref())?;

        let partner = self
            .partner_repository
            .update(id, request)
            .await?
            .ok_or_else(|| AscesaError::NotFound("Partner".to_string()))?;

        info!(partner_id = id, "Partner updated");
        Ok(partner)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.partner_repository.delete(id).await? {
            return Err(AscesaError::NotFound("Partner".to_string()));
        }
        info!(partner_id = id, "Partner deleted");
        Ok(())
    }

    pub async fn list(&self, query: &PageQuery, include_inactive: bool) -> Result<Page<Partner>> {
        debug!(include_inactive = include_inactive, "Listing partners");

        let partners = self
            .partner_repository
            .list(include_inactive, query.limit(), query.offset())
            .await?;
        let total = self.partner_repository.count(include_inactive).await?;

        Ok(Page::new(partners, total, query))
    }
}

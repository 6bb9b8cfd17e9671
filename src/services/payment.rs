//! Payment service implementation
//!
//! Membership fees are recorded by administrators; members only read their
//! own history.

use chrono::Utc;
use tracing::{debug, info};

use crate::database::repositories::{PaymentRepository, UserRepository};
use crate::models::pagination::{Page, PageQuery};
use crate::models::payment::{CreatePaymentRequest, Payment, PaymentStatus, UpdatePaymentRequest};
use crate::services::auth::AuthContext;
use crate::utils::errors::{AscesaError, Result};
use crate::utils::helpers::normalize_whitespace;

fn check_amount(amount_cents: i64) -> Result<()> {
    if amount_cents <= 0 {
        return Err(AscesaError::InvalidInput("Amount must be greater than zero".to_string()));
    }
    Ok(())
}

/// Fill in `paid_at` when a charge is marked paid without a timestamp
pub fn reconcile_paid_at(request: &mut UpdatePaymentRequest) {
    if request.status == Some(PaymentStatus::Paid) && request.paid_at.is_none() {
        request.paid_at = Some(Utc::now());
    }
}

#[derive(Clone)]
pub struct PaymentService {
    payment_repository: PaymentRepository,
    user_repository: UserRepository,
}

impl PaymentService {
    pub fn new(payment_repository: PaymentRepository, user_repository: UserRepository) -> Self {
        Self {
            payment_repository,
            user_repository,
        }
    }

    pub async fn create(&self, mut request: CreatePaymentRequest) -> Result<Payment> {
        check_amount(request.amount_cents)?;
        request.description = request
            .description
            .map(|d| normalize_whitespace(&d))
            .filter(|d| !d.is_empty());

        if self.user_repository.find_by_id(request.user_id).await?.is_none() {
            return Err(AscesaError::InvalidInput(format!("User {} does not exist", request.user_id)));
        }

        let payment = self.payment_repository.create(request).await?;
        info!(
            payment_id = payment.id,
            user_id = payment.user_id,
            amount_cents = payment.amount_cents,
            "Payment recorded"
        );
        Ok(payment)
    }

    /// Get a payment visible to the caller
    pub async fn get(&self, id: i64, caller: &AuthContext) -> Result<Payment> {
        let payment = self
            .payment_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AscesaError::NotFound("Payment".to_string()))?;

        caller.require_owner_or_admin(payment.user_id)?;
        Ok(payment)
    }

    pub async fn update(&self, id: i64, mut request: UpdatePaymentRequest) -> Result<Payment> {
        if let Some(amount) = request.amount_cents {
            check_amount(amount)?;
        }
        reconcile_paid_at(&mut request);

        let payment = self
            .payment_repository
            .update(id, request)
            .await?
            .ok_or_else(|| AscesaError::NotFound("Payment".to_string()))?;

        info!(payment_id = id, status = ?payment.status, "Payment updated");
        Ok(payment)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.payment_repository.delete(id).await? {
            return Err(AscesaError::NotFound("Payment".to_string()));
        }
        info!(payment_id = id, "Payment deleted");
        Ok(())
    }

    /// Members see their own payments, admins see all of them
    pub async fn list(&self, query: &PageQuery, caller: &AuthContext) -> Result<Page<Payment>> {
        let owner = caller.owner_filter();
        debug!(owner = ?owner, "Listing payments");

        let payments = self
            .payment_repository
            .list(owner, query.limit(), query.offset())
            .await?;
        let total = self.payment_repository.count(owner).await?;

        Ok(Page::new(payments, total, query))
    }

    /// Move pending charges past their due date to overdue
    pub async fn mark_overdue(&self) -> Result<u64> {
        let updated = self.payment_repository.mark_overdue(Utc::now()).await?;
        if updated > 0 {
            info!(count = updated, "Payments marked overdue");
        }
        Ok(updated)
    }
}

//! Benefit repository implementation

use chrono::Utc;
use sqlx::PgPool;

use crate::models::benefit::{Benefit, CreateBenefitRequest, UpdateBenefitRequest};
use crate::utils::errors::AscesaError;

#[derive(Clone, Debug)]
pub struct BenefitRepository {
    pool: PgPool,
}

impl BenefitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new benefit
    pub async fn create(&self, request: CreateBenefitRequest) -> Result<Benefit, AscesaError> {
        let now = Utc::now();
        let benefit = sqlx::query_as::<_, Benefit>(
            r#"
            INSERT INTO benefits (partner_id, title, description, category, discount, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, partner_id, title, description, category, discount, is_active, created_at, updated_at
            "#,
        )
        .bind(request.partner_id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.category)
        .bind(request.discount)
        .bind(request.is_active.unwrap_or(true))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(benefit)
    }

    /// Find benefit by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Benefit>, AscesaError> {
        let benefit = sqlx::query_as::<_, Benefit>(
            "SELECT id, partner_id, title, description, category, discount, is_active, created_at, updated_at FROM benefits WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(benefit)
    }

    /// Update benefit
    pub async fn update(&self, id: i64, request: UpdateBenefitRequest) -> Result<Option<Benefit>, AscesaError> {
        let benefit = sqlx::query_as::<_, Benefit>(
            r#"
            UPDATE benefits
            SET partner_id = COALESCE($2, partner_id),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                discount = COALESCE($6, discount),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE id = $1
            RETURNING id, partner_id, title, description, category, discount, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(request.partner_id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.category)
        .bind(request.discount)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(benefit)
    }

    /// Delete benefit
    pub async fn delete(&self, id: i64) -> Result<bool, AscesaError> {
        let result = sqlx::query("DELETE FROM benefits WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List benefits, optionally including inactive ones
    pub async fn list(&self, include_inactive: bool, limit: i64, offset: i64) -> Result<Vec<Benefit>, AscesaError> {
        let benefits = sqlx::query_as::<_, Benefit>(
            r#"
            SELECT id, partner_id, title, description, category, discount, is_active, created_at, updated_at
            FROM benefits
            WHERE ($1 OR is_active)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(include_inactive)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(benefits)
    }

    /// Count benefits matching the same filter as `list`
    pub async fn count(&self, include_inactive: bool) -> Result<i64, AscesaError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM benefits WHERE ($1 OR is_active)")
            .bind(include_inactive)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Active benefits offered by one partner
    pub async fn find_by_partner(&self, partner_id: i64) -> Result<Vec<Benefit>, AscesaError> {
        let benefits = sqlx::query_as::<_, Benefit>(
            "SELECT id, partner_id, title, description, category, discount, is_active, created_at, updated_at FROM benefits WHERE partner_id = $1 AND is_active ORDER BY title ASC",
        )
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(benefits)
    }
}

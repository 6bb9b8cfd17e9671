//! Partner repository implementation

use chrono::Utc;
use sqlx::PgPool;

use crate::models::partner::{CreatePartnerRequest, Partner, UpdatePartnerRequest};
use crate::utils::errors::AscesaError;

#[derive(Clone, Debug)]
pub struct PartnerRepository {
    pool: PgPool,
}

impl PartnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new partner
    pub async fn create(&self, request: CreatePartnerRequest) -> Result<Partner, AscesaError> {
        let now = Utc::now();
        let partner = sqlx::query_as::<_, Partner>(
            r#"
            INSERT INTO partners (name, description, category, website, logo_url, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, description, category, website, logo_url, is_active, created_at, updated_at
            "#,
        )
        .bind(request.name)
        .bind(request.description)
        .bind(request.category)
        .bind(request.website)
        .bind(request.logo_url)
        .bind(request.is_active.unwrap_or(true))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(partner)
    }

    /// Find partner by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Partner>, AscesaError> {
        let partner = sqlx::query_as::<_, Partner>(
            "SELECT id, name, description, category, website, logo_url, is_active, created_at, updated_at FROM partners WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(partner)
    }

    /// Update partner
    pub async fn update(&self, id: i64, request: UpdatePartnerRequest) -> Result<Option<Partner>, AscesaError> {
        let partner = sqlx::query_as::<_, Partner>(
            r#"
            UPDATE partners
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                website = COALESCE($5, website),
                logo_url = COALESCE($6, logo_url),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE id = $1
            RETURNING id, name, description, category, website, logo_url, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.category)
        .bind(request.website)
        .bind(request.logo_url)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(partner)
    }

    /// Delete partner; its benefits keep existing without a partner
    pub async fn delete(&self, id: i64) -> Result<bool, AscesaError> {
        let result = sqlx::query("DELETE FROM partners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List partners, optionally including inactive ones
    pub async fn list(&self, include_inactive: bool, limit: i64, offset: i64) -> Result<Vec<Partner>, AscesaError> {
        let partners = sqlx::query_as::<_, Partner>(
            r#"
            SELECT id, name, description, category, website, logo_url, is_active, created_at, updated_at
            FROM partners
            WHERE ($1 OR is_active)
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(include_inactive)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(partners)
    }

    /// Count partners matching the same filter as `list`
    pub async fn count(&self, include_inactive: bool) -> Result<i64, AscesaError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM partners WHERE ($1 OR is_active)")
            .bind(include_inactive)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

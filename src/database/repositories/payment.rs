//! Payment repository implementation

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::payment::{CreatePaymentRequest, Payment, PaymentStatus, UpdatePaymentRequest};
use crate::utils::errors::AscesaError;

const PAYMENT_COLUMNS: &str =
    "id, user_id, amount_cents, description, due_date, paid_at, method, status, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending charge
    pub async fn create(&self, request: CreatePaymentRequest) -> Result<Payment, AscesaError> {
        let now = Utc::now();
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (user_id, amount_cents, description, due_date, method, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(request.amount_cents)
        .bind(request.description)
        .bind(request.due_date)
        .bind(request.method)
        .bind(PaymentStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Find payment by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Payment>, AscesaError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Update payment
    pub async fn update(&self, id: i64, request: UpdatePaymentRequest) -> Result<Option<Payment>, AscesaError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET amount_cents = COALESCE($2, amount_cents),
                description = COALESCE($3, description),
                due_date = COALESCE($4, due_date),
                method = COALESCE($5, method),
                status = COALESCE($6, status),
                paid_at = COALESCE($7, paid_at),
                updated_at = $8
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.amount_cents)
        .bind(request.description)
        .bind(request.due_date)
        .bind(request.method)
        .bind(request.status)
        .bind(request.paid_at)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Delete payment
    pub async fn delete(&self, id: i64) -> Result<bool, AscesaError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List payments, restricted to one member when `user_id` is set
    pub async fn list(&self, user_id: Option<i64>, limit: i64, offset: i64) -> Result<Vec<Payment>, AscesaError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
            ORDER BY due_date DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Count payments matching the same filter as `list`
    pub async fn count(&self, user_id: Option<i64>) -> Result<i64, AscesaError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM payments WHERE ($1::BIGINT IS NULL OR user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    /// Flag pending charges whose due date has passed
    pub async fn mark_overdue(&self, as_of: DateTime<Utc>) -> Result<u64, AscesaError> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'overdue', updated_at = $1 WHERE status = 'pending' AND due_date < $2",
        )
        .bind(as_of)
        .bind(as_of.date_naive())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

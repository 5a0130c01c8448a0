//! Payment ledger store

use async_trait::async_trait;
use chrono::Utc;
use common::ServiceResult;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Payment, PaymentStatus};

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: Payment) -> ServiceResult<Payment>;

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Payment>>;

    /// Payments in creation order, optionally only those of one user
    async fn list(&self, user_id: Option<Uuid>) -> ServiceResult<Vec<Payment>>;

    async fn set_status(&self, id: Uuid, status: PaymentStatus) -> ServiceResult<Option<Payment>>;

    async fn delete(&self, id: Uuid) -> ServiceResult<bool>;
}

const COLUMNS: &str =
    "id, user_id, amount, payment_date, payment_method, status, created_at, updated_at";

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn insert(&self, payment: Payment) -> ServiceResult<Payment> {
        let query = format!(
            r#"
            INSERT INTO payments ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        );

        let inserted = sqlx::query_as::<_, Payment>(&query)
            .bind(payment.id)
            .bind(payment.user_id)
            .bind(payment.amount)
            .bind(payment.payment_date)
            .bind(payment.payment_method)
            .bind(payment.status)
            .bind(payment.created_at)
            .bind(payment.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Payment>> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");

        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    async fn list(&self, user_id: Option<Uuid>) -> ServiceResult<Vec<Payment>> {
        let query = format!(
            r#"
            SELECT {COLUMNS} FROM payments
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at, id
            "#
        );

        let payments = sqlx::query_as::<_, Payment>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    async fn set_status(&self, id: Uuid, status: PaymentStatus) -> ServiceResult<Option<Payment>> {
        let query = format!(
            "UPDATE payments SET status = $2, updated_at = now() WHERE id = $1 RETURNING {COLUMNS}"
        );

        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone, Default)]
pub struct MemoryPaymentRepository {
    payments: Arc<RwLock<Vec<Payment>>>,
}

impl MemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentRepository {
    async fn insert(&self, payment: Payment) -> ServiceResult<Payment> {
        self.payments.write().await.push(payment.clone());
        Ok(payment)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Payment>> {
        Ok(self.payments.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, user_id: Option<Uuid>) -> ServiceResult<Vec<Payment>> {
        Ok(self
            .payments
            .read()
            .await
            .iter()
            .filter(|p| user_id.is_none_or(|id| p.user_id == id))
            .cloned()
            .collect())
    }

    async fn set_status(&self, id: Uuid, status: PaymentStatus) -> ServiceResult<Option<Payment>> {
        let mut payments = self.payments.write().await;
        Ok(payments.iter_mut().find(|p| p.id == id).map(|payment| {
            payment.status = status;
            payment.updated_at = Utc::now();
            payment.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        let mut payments = self.payments.write().await;
        let before = payments.len();
        payments.retain(|p| p.id != id);
        Ok(payments.len() != before)
    }
}

//! Collection record store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ServiceResult;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{CollectionRecord, CollectionStatus};

#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn insert(&self, record: CollectionRecord) -> ServiceResult<CollectionRecord>;

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<CollectionRecord>>;

    /// Point the record at `personnel_id`, leaving every other field alone.
    /// `Ok(None)` when it no longer exists.
    async fn assign_personnel(
        &self,
        id: Uuid,
        personnel_id: Uuid,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<CollectionRecord>>;

    /// Move the record to `status` if it is still pending or already there.
    /// `Ok(None)` when it no longer exists or has closed with another status.
    async fn set_status(
        &self,
        id: Uuid,
        status: CollectionStatus,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<CollectionRecord>>;

    async fn delete(&self, id: Uuid) -> ServiceResult<bool>;

    /// Records created by `creator_id`, in creation order
    async fn list_by_creator(&self, creator_id: Uuid) -> ServiceResult<Vec<CollectionRecord>>;

    /// Every record, in creation order
    async fn list_all(&self) -> ServiceResult<Vec<CollectionRecord>>;

    /// Records dated on or after `from` and, when given, before `until`,
    /// ordered by collection date
    async fn list_dated(
        &self,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> ServiceResult<Vec<CollectionRecord>>;
}

const COLUMNS: &str = "id, creator_id, location, waste_type, quantity, status, missed, \
                       assigned_personnel_id, collection_date, created_at, updated_at";

/// PostgreSQL-backed collection store
#[derive(Clone)]
pub struct CollectionRepository {
    pool: PgPool,
}

impl CollectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CollectionStore for CollectionRepository {
    async fn insert(&self, record: CollectionRecord) -> ServiceResult<CollectionRecord> {
        let query = format!(
            r#"
            INSERT INTO collection_records ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COLUMNS}
            "#
        );

        let inserted = sqlx::query_as::<_, CollectionRecord>(&query)
            .bind(record.id)
            .bind(record.creator_id)
            .bind(&record.location)
            .bind(record.waste_type)
            .bind(record.quantity)
            .bind(record.status)
            .bind(record.missed)
            .bind(record.assigned_personnel_id)
            .bind(record.collection_date)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<CollectionRecord>> {
        let query = format!("SELECT {COLUMNS} FROM collection_records WHERE id = $1");

        let record = sqlx::query_as::<_, CollectionRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn assign_personnel(
        &self,
        id: Uuid,
        personnel_id: Uuid,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<CollectionRecord>> {
        let query = format!(
            r#"
            UPDATE collection_records
            SET assigned_personnel_id = $2, updated_at = $3
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, CollectionRecord>(&query)
            .bind(id)
            .bind(personnel_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: CollectionStatus,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<CollectionRecord>> {
        let query = format!(
            r#"
            UPDATE collection_records
            SET status = $2, missed = $3, updated_at = $4
            WHERE id = $1 AND (status = 'pending' OR status = $2)
            RETURNING {COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, CollectionRecord>(&query)
            .bind(id)
            .bind(status)
            .bind(status == CollectionStatus::Missed)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM collection_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> ServiceResult<Vec<CollectionRecord>> {
        let query = format!(
            "SELECT {COLUMNS} FROM collection_records WHERE creator_id = $1 ORDER BY created_at, id"
        );

        let records = sqlx::query_as::<_, CollectionRecord>(&query)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn list_all(&self) -> ServiceResult<Vec<CollectionRecord>> {
        let query = format!("SELECT {COLUMNS} FROM collection_records ORDER BY created_at, id");

        let records = sqlx::query_as::<_, CollectionRecord>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn list_dated(
        &self,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> ServiceResult<Vec<CollectionRecord>> {
        let query = format!(
            r#"
            SELECT {COLUMNS} FROM collection_records
            WHERE collection_date >= $1
              AND ($2::timestamptz IS NULL OR collection_date < $2)
            ORDER BY collection_date, id
            "#
        );

        let records = sqlx::query_as::<_, CollectionRecord>(&query)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }
}

/// In-memory collection store
#[derive(Clone, Default)]
pub struct MemoryCollectionRepository {
    records: Arc<RwLock<Vec<CollectionRecord>>>,
}

impl MemoryCollectionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CollectionStore for MemoryCollectionRepository {
    async fn insert(&self, record: CollectionRecord) -> ServiceResult<CollectionRecord> {
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<CollectionRecord>> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn assign_personnel(
        &self,
        id: Uuid,
        personnel_id: Uuid,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<CollectionRecord>> {
        let mut records = self.records.write().await;
        Ok(records.iter_mut().find(|r| r.id == id).map(|slot| {
            slot.assigned_personnel_id = Some(personnel_id);
            slot.updated_at = at;
            slot.clone()
        }))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: CollectionStatus,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<CollectionRecord>> {
        let mut records = self.records.write().await;
        Ok(records
            .iter_mut()
            .find(|r| r.id == id && (r.status == CollectionStatus::Pending || r.status == status))
            .map(|slot| {
                slot.set_status(status);
                slot.updated_at = at;
                slot.clone()
            }))
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> ServiceResult<Vec<CollectionRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> ServiceResult<Vec<CollectionRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn list_dated(
        &self,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> ServiceResult<Vec<CollectionRecord>> {
        let mut records: Vec<_> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.collection_date >= from && until.is_none_or(|u| r.collection_date < u))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.collection_date);
        Ok(records)
    }
}

//! Schedule store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ServiceResult;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{CollectionStatus, Schedule};

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn insert(&self, schedule: Schedule) -> ServiceResult<Schedule>;

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Schedule>>;

    async fn assign_personnel(
        &self,
        id: Uuid,
        personnel_id: Uuid,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<Schedule>>;

    /// Same guard as [`CollectionStore::set_status`](super::CollectionStore::set_status)
    async fn set_status(
        &self,
        id: Uuid,
        status: CollectionStatus,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<Schedule>>;

    /// Every schedule, in creation order
    async fn list_all(&self) -> ServiceResult<Vec<Schedule>>;
}

const COLUMNS: &str = "id, user_id, created_by, scheduled_date, status, area, notes, \
                       assigned_personnel_id, created_at, updated_at";

#[derive(Clone)]
pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleStore for ScheduleRepository {
    async fn insert(&self, schedule: Schedule) -> ServiceResult<Schedule> {
        let query = format!(
            r#"
            INSERT INTO schedules ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        );

        let inserted = sqlx::query_as::<_, Schedule>(&query)
            .bind(schedule.id)
            .bind(schedule.user_id)
            .bind(schedule.created_by)
            .bind(schedule.scheduled_date)
            .bind(schedule.status)
            .bind(&schedule.area)
            .bind(&schedule.notes)
            .bind(schedule.assigned_personnel_id)
            .bind(schedule.created_at)
            .bind(schedule.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Schedule>> {
        let query = format!("SELECT {COLUMNS} FROM schedules WHERE id = $1");

        let schedule = sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(schedule)
    }

    async fn assign_personnel(
        &self,
        id: Uuid,
        personnel_id: Uuid,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<Schedule>> {
        let query = format!(
            r#"
            UPDATE schedules
            SET assigned_personnel_id = $2, updated_at = $3
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );

        let schedule = sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .bind(personnel_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(schedule)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: CollectionStatus,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<Schedule>> {
        let query = format!(
            r#"
            UPDATE schedules
            SET status = $2, updated_at = $3
            WHERE id = $1 AND (status = 'pending' OR status = $2)
            RETURNING {COLUMNS}
            "#
        );

        let schedule = sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .bind(status)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(schedule)
    }

    async fn list_all(&self) -> ServiceResult<Vec<Schedule>> {
        let query = format!("SELECT {COLUMNS} FROM schedules ORDER BY created_at, id");

        let schedules = sqlx::query_as::<_, Schedule>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(schedules)
    }
}

#[derive(Clone, Default)]
pub struct MemoryScheduleRepository {
    schedules: Arc<RwLock<Vec<Schedule>>>,
}

impl MemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleRepository {
    async fn insert(&self, schedule: Schedule) -> ServiceResult<Schedule> {
        self.schedules.write().await.push(schedule.clone());
        Ok(schedule)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Schedule>> {
        Ok(self
            .schedules
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn assign_personnel(
        &self,
        id: Uuid,
        personnel_id: Uuid,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<Schedule>> {
        let mut schedules = self.schedules.write().await;
        Ok(schedules.iter_mut().find(|s| s.id == id).map(|slot| {
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
    ) -> ServiceResult<Option<Schedule>> {
        let mut schedules = self.schedules.write().await;
        Ok(schedules
            .iter_mut()
            .find(|s| s.id == id && (s.status == CollectionStatus::Pending || s.status == status))
            .map(|slot| {
                slot.status = status;
                slot.updated_at = at;
                slot.clone()
            }))
    }

    async fn list_all(&self) -> ServiceResult<Vec<Schedule>> {
        Ok(self.schedules.read().await.clone())
    }
}

//! Report store

use async_trait::async_trait;
use common::ServiceResult;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Report;

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert(&self, report: Report) -> ServiceResult<Report>;

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Report>>;

    /// Reports in creation order
    async fn list_all(&self) -> ServiceResult<Vec<Report>>;

    async fn delete(&self, id: Uuid) -> ServiceResult<bool>;
}

const COLUMNS: &str = "id, generated_by, report_type, criteria, data, file_path, created_at";

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for ReportRepository {
    async fn insert(&self, report: Report) -> ServiceResult<Report> {
        let query = format!(
            r#"
            INSERT INTO reports ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        );

        let inserted = sqlx::query_as::<_, Report>(&query)
            .bind(report.id)
            .bind(report.generated_by)
            .bind(report.report_type)
            .bind(&report.criteria)
            .bind(&report.data)
            .bind(&report.file_path)
            .bind(report.created_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Report>> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");

        let report = sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(report)
    }

    async fn list_all(&self) -> ServiceResult<Vec<Report>> {
        let query = format!("SELECT {COLUMNS} FROM reports ORDER BY created_at, id");

        let reports = sqlx::query_as::<_, Report>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(reports)
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone, Default)]
pub struct MemoryReportRepository {
    reports: Arc<RwLock<Vec<Report>>>,
}

impl MemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryReportRepository {
    async fn insert(&self, report: Report) -> ServiceResult<Report> {
        self.reports.write().await.push(report.clone());
        Ok(report)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Report>> {
        Ok(self.reports.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> ServiceResult<Vec<Report>> {
        Ok(self.reports.read().await.clone())
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|r| r.id != id);
        Ok(reports.len() != before)
    }
}

//! Report archive ledger
//!
//! Generating a report aggregates the collection records in its period,
//! renders a PDF on a blocking worker, archives the file and then stores
//! the report row pointing at it.

use auth::{Operation, Role, User, ensure_role, repositories::IdentityStore};
use chrono::Utc;
use common::{ServiceError, ServiceResult};
use sqlx::types::Json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    lifecycle::summaries,
    models::{Report, ReportType, ReportView},
    reporting::{ReportArchive, ReportDocument, ReportPeriod, aggregate, render, report_key},
    repositories::{CollectionStore, ReportStore},
};

const REPORT_NOT_FOUND: &str = "Report not found";

/// A rendered report ready for download
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ReportLedger {
    reports: Arc<dyn ReportStore>,
    records: Arc<dyn CollectionStore>,
    users: Arc<dyn IdentityStore>,
    archive: Arc<dyn ReportArchive>,
}

impl ReportLedger {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        records: Arc<dyn CollectionStore>,
        users: Arc<dyn IdentityStore>,
        archive: Arc<dyn ReportArchive>,
    ) -> Self {
        Self {
            reports,
            records,
            users,
            archive,
        }
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Report> {
        self.reports
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(REPORT_NOT_FOUND))
    }

    fn ensure_generator(actor: &User, report: &Report) -> ServiceResult<()> {
        if actor.role != Role::Admin && report.generated_by != actor.id {
            return Err(ServiceError::forbidden("Not authorized to access this report"));
        }
        Ok(())
    }

    async fn views(&self, reports: Vec<Report>) -> ServiceResult<Vec<ReportView>> {
        let users = summaries(self.users.as_ref(), reports.iter().map(|r| r.generated_by)).await?;
        Ok(reports
            .into_iter()
            .map(|report| ReportView {
                generated_by_user: users.get(&report.generated_by).cloned(),
                report,
            })
            .collect())
    }

    pub async fn generate(
        &self,
        actor: &User,
        report_type: Option<&str>,
        criteria: Option<&str>,
    ) -> ServiceResult<Report> {
        ensure_role(actor, Operation::GenerateReport)?;
        let report_type = match report_type.map(str::trim) {
            Some(t) if !t.is_empty() => t.parse::<ReportType>().map_err(ServiceError::Validation)?,
            _ => return Err(ServiceError::validation("Report type is required")),
        };
        let criteria = criteria
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::validation("Criteria are required"))?;
        let period = ReportPeriod::parse(report_type, criteria)?;

        let records = self
            .records
            .list_dated(period.start_utc(), Some(period.end_utc()))
            .await?;
        let rows = aggregate(&records);

        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let document = ReportDocument {
            report_type,
            criteria: criteria.to_string(),
            generated_by: actor.name.clone(),
            generated_at: created_at,
            rows: rows.clone(),
        };
        let bytes = tokio::task::spawn_blocking(move || render(&document))
            .await
            .map_err(|e| ServiceError::internal(anyhow::anyhow!("Report rendering failed: {}", e)))?;

        let key = report_key(id);
        self.archive
            .store(&key, bytes)
            .await
            .map_err(|e| ServiceError::internal(e.context("Failed to archive report")))?;

        let inserted = self
            .reports
            .insert(Report {
                id,
                generated_by: actor.id,
                report_type,
                criteria: criteria.to_string(),
                data: Json(rows),
                file_path: Some(key.clone()),
                created_at,
            })
            .await;
        let report = match inserted {
            Ok(report) => report,
            Err(err) => {
                if let Err(cleanup) = self.archive.remove(&key).await {
                    warn!(error = %cleanup, key = %key, "Failed to remove archived report after insert failure");
                }
                return Err(err);
            }
        };
        info!(report_id = %report.id, admin_id = %actor.id, report_type = %report_type, collections = records.len(), "Generated report");
        Ok(report)
    }

    pub async fn list(&self, actor: &User) -> ServiceResult<Vec<ReportView>> {
        ensure_role(actor, Operation::ListReports)?;
        let reports = self.reports.list_all().await?;
        self.views(reports).await
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> ServiceResult<ReportView> {
        ensure_role(actor, Operation::ViewReport)?;
        let report = self.load(id).await?;
        Self::ensure_generator(actor, &report)?;

        let mut views = self.views(vec![report]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::not_found(REPORT_NOT_FOUND))
    }

    pub async fn download(&self, actor: &User, id: Uuid) -> ServiceResult<ReportFile> {
        ensure_role(actor, Operation::DownloadReport)?;
        let report = self.load(id).await?;
        Self::ensure_generator(actor, &report)?;

        let file_missing = || ServiceError::not_found("Report file not found");
        let key = report.file_path.ok_or_else(file_missing)?;
        let bytes = self
            .archive
            .load(&key)
            .await
            .map_err(ServiceError::internal)?
            .ok_or_else(file_missing)?;

        Ok(ReportFile {
            file_name: key,
            bytes,
        })
    }

    /// Delete the report and its archived file
    pub async fn delete(&self, actor: &User, id: Uuid) -> ServiceResult<()> {
        ensure_role(actor, Operation::DeleteReport)?;
        let report = self.load(id).await?;

        if !self.reports.delete(id).await? {
            return Err(ServiceError::not_found(REPORT_NOT_FOUND));
        }
        if let Some(key) = &report.file_path {
            if let Err(e) = self.archive.remove(key).await {
                warn!(report_id = %id, "Failed to remove archived report file: {:#}", e);
            }
        }
        info!(report_id = %id, admin_id = %actor.id, "Deleted report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{CollectionRecord, WasteCategory},
        reporting::MemoryReportArchive,
        repositories::{MemoryCollectionRepository, MemoryReportRepository},
    };
    use async_trait::async_trait;
    use auth::{models::NewUser, repositories::MemoryUserRepository};
    use chrono::{TimeZone, Utc};

    /// Refuses every insert
    struct FullReportStore;

    #[async_trait]
    impl ReportStore for FullReportStore {
        async fn insert(&self, _report: Report) -> ServiceResult<Report> {
            Err(ServiceError::internal(anyhow::anyhow!("disk full")))
        }

        async fn find_by_id(&self, _id: Uuid) -> ServiceResult<Option<Report>> {
            Ok(None)
        }

        async fn list_all(&self) -> ServiceResult<Vec<Report>> {
            Ok(Vec::new())
        }

        async fn delete(&self, _id: Uuid) -> ServiceResult<bool> {
            Ok(false)
        }
    }

    struct Fixture {
        ledger: ReportLedger,
        archive: MemoryReportArchive,
        admin: User,
        citizen: User,
    }

    async fn fixture() -> Fixture {
        fixture_with(Arc::new(MemoryReportRepository::new())).await
    }

    async fn fixture_with(reports: Arc<dyn ReportStore>) -> Fixture {
        let users = MemoryUserRepository::new();
        let mut created = Vec::new();
        for (name, role) in [("Admin", Role::Admin), ("Chamari", Role::Citizen)] {
            created.push(
                users
                    .create(NewUser {
                        name: name.to_string(),
                        email: format!("{}@example.com", name.to_lowercase()),
                        password_hash: "hash".to_string(),
                        role,
                    })
                    .await
                    .unwrap(),
            );
        }
        let citizen = created.pop().unwrap();
        let admin = created.pop().unwrap();

        let records = MemoryCollectionRepository::new();
        for (day, category, quantity) in [
            (3, WasteCategory::Plastic, 2.0),
            (20, WasteCategory::Plastic, 4.5),
            (28, WasteCategory::Organic, 10.0),
        ] {
            records
                .insert(CollectionRecord::new(
                    citizen.id,
                    "Matara".to_string(),
                    category,
                    quantity,
                    Some(Utc.with_ymd_and_hms(2026, 2, day, 10, 0, 0).unwrap()),
                ))
                .await
                .unwrap();
        }
        records
            .insert(CollectionRecord::new(
                citizen.id,
                "Matara".to_string(),
                WasteCategory::Glass,
                1.0,
                Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()),
            ))
            .await
            .unwrap();

        let archive = MemoryReportArchive::new();
        Fixture {
            ledger: ReportLedger::new(
                reports,
                Arc::new(records),
                Arc::new(users),
                Arc::new(archive.clone()),
            ),
            archive,
            admin,
            citizen,
        }
    }

    #[tokio::test]
    async fn monthly_report_aggregates_and_archives() {
        let f = fixture().await;
        let report = f
            .ledger
            .generate(&f.admin, Some("monthly"), Some("2026-02"))
            .await
            .unwrap();

        let rows = &report.data.0;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].waste_type, WasteCategory::Organic);
        assert_eq!(rows[1].waste_type, WasteCategory::Plastic);
        assert_eq!(rows[1].total_collections, 2);
        assert_eq!(rows[1].total_quantity, 6.5);

        let file = f.ledger.download(&f.admin, report.id).await.unwrap();
        assert!(file.bytes.starts_with(b"%PDF-"));
        assert_eq!(Some(file.file_name), report.file_path);
        assert_eq!(f.archive.keys().await, vec![report_key(report.id)]);
    }

    #[tokio::test]
    async fn failed_insert_leaves_no_archived_file() {
        let f = fixture_with(Arc::new(FullReportStore)).await;
        let err = f
            .ledger
            .generate(&f.admin, Some("monthly"), Some("2026-02"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Internal(_)));
        assert!(f.archive.keys().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_criteria_store_nothing() {
        let f = fixture().await;
        let err = f
            .ledger
            .generate(&f.admin, Some("annual"), Some("last year"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(f.ledger.list(&f.admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn citizens_cannot_generate_or_read_others_reports() {
        let f = fixture().await;
        let err = f
            .ledger
            .generate(&f.citizen, Some("annual"), Some("2026"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));

        let report = f
            .ledger
            .generate(&f.admin, Some("annual"), Some("2026"))
            .await
            .unwrap();
        let err = f.ledger.download(&f.citizen, report.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
    }

    #[tokio::test]
    async fn delete_removes_archived_file() {
        let f = fixture().await;
        let report = f
            .ledger
            .generate(&f.admin, Some("custom"), Some("2026-02-01,2026-02-28"))
            .await
            .unwrap();
        let key = report.file_path.clone().unwrap();

        f.ledger.delete(&f.admin, report.id).await.unwrap();
        assert!(f.archive.load(&key).await.unwrap().is_none());
        let err = f.ledger.get(&f.admin, report.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}

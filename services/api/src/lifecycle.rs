//! Collection lifecycle engine
//!
//! A record starts `pending`, may be assigned to a personnel user, and is
//! closed by moving to `completed` or `missed`. Every operation checks the
//! actor's role against the policy table before reading or writing, then
//! applies its own ownership rule once the target record is loaded.

use auth::{Operation, Role, User, UserSummary, ensure_role, repositories::IdentityStore};
use chrono::{DateTime, Utc};
use common::{ServiceError, ServiceResult};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::info;
use uuid::Uuid;

use crate::{
    analytics::{self, Analytics},
    models::{CollectionRecord, CollectionStatus, CollectionView, WasteCategory},
    notify::Notifier,
    repositories::CollectionStore,
};

const RECORD_NOT_FOUND: &str = "Waste collection record not found";

/// Prefix of the code printed on a user's collection card
pub const QR_PREFIX: &str = "User:";

/// Unvalidated input for a new collection record
#[derive(Debug, Clone, Default)]
pub struct CollectionDraft {
    pub location: Option<String>,
    pub waste_type: Option<String>,
    pub quantity: Option<f64>,
    pub collection_date: Option<DateTime<Utc>>,
}

impl CollectionDraft {
    fn validate(self, creator_id: Uuid) -> ServiceResult<CollectionRecord> {
        let location = self
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ServiceError::validation("Location is required"))?;

        let waste_type = match self.waste_type.as_deref().map(str::trim) {
            Some(w) if !w.is_empty() => w
                .parse::<WasteCategory>()
                .map_err(ServiceError::Validation)?,
            _ => return Err(ServiceError::validation("Waste type is required")),
        };

        let quantity = self
            .quantity
            .ok_or_else(|| ServiceError::validation("Quantity is required"))?;
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(ServiceError::validation("Quantity must be greater than zero"));
        }

        Ok(CollectionRecord::new(
            creator_id,
            location,
            waste_type,
            quantity,
            self.collection_date,
        ))
    }
}

/// Parse a requested status
pub fn parse_status(status: Option<&str>) -> ServiceResult<CollectionStatus> {
    match status.map(str::trim) {
        Some(s) if !s.is_empty() => s.parse().map_err(ServiceError::Validation),
        _ => Err(ServiceError::validation("Status is required")),
    }
}

/// Load the assignee and check it holds the personnel role
pub async fn resolve_personnel(
    users: &dyn IdentityStore,
    personnel_id: Option<Uuid>,
) -> ServiceResult<User> {
    let personnel_id =
        personnel_id.ok_or_else(|| ServiceError::validation("Personnel id is required"))?;
    let personnel = users
        .find_by_id(personnel_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Personnel not found"))?;

    if personnel.role != Role::Personnel {
        return Err(ServiceError::validation(format!(
            "User {} is not personnel",
            personnel.id
        )));
    }
    Ok(personnel)
}

/// Personnel may only act on work assigned to them
pub fn ensure_assignee(actor: &User, assigned: Option<Uuid>) -> ServiceResult<()> {
    if actor.role == Role::Personnel && assigned != Some(actor.id) {
        return Err(ServiceError::forbidden(
            "Not authorized to update work assigned to someone else",
        ));
    }
    Ok(())
}

/// Summaries of the given users, keyed by id
pub async fn summaries(
    users: &dyn IdentityStore,
    ids: impl IntoIterator<Item = Uuid>,
) -> ServiceResult<HashMap<Uuid, UserSummary>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();

    Ok(users
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.summary()))
        .collect())
}

/// Result of scanning a user's collection card
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub user: UserSummary,
    pub waste_collections: Vec<CollectionRecord>,
}

#[derive(Clone)]
pub struct CollectionEngine {
    records: Arc<dyn CollectionStore>,
    users: Arc<dyn IdentityStore>,
    notifier: Arc<dyn Notifier>,
}

impl CollectionEngine {
    pub fn new(
        records: Arc<dyn CollectionStore>,
        users: Arc<dyn IdentityStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            records,
            users,
            notifier,
        }
    }

    async fn load(&self, id: Uuid) -> ServiceResult<CollectionRecord> {
        self.records
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(RECORD_NOT_FOUND))
    }

    /// Write `status`, or explain why the store refused it
    async fn write_status(
        &self,
        id: Uuid,
        status: CollectionStatus,
    ) -> ServiceResult<CollectionRecord> {
        if let Some(record) = self.records.set_status(id, status, Utc::now()).await? {
            return Ok(record);
        }

        // Another writer closed or removed the record after it was read
        let current = self.load(id).await?;
        current.status.transition(status)?;
        Ok(current)
    }

    async fn views(&self, records: Vec<CollectionRecord>) -> ServiceResult<Vec<CollectionView>> {
        let ids = records
            .iter()
            .flat_map(|r| std::iter::once(r.creator_id).chain(r.assigned_personnel_id));
        let users = summaries(self.users.as_ref(), ids).await?;

        Ok(records
            .into_iter()
            .map(|record| CollectionView {
                creator: users.get(&record.creator_id).cloned(),
                assigned_personnel: record
                    .assigned_personnel_id
                    .and_then(|id| users.get(&id).cloned()),
                record,
            })
            .collect())
    }

    async fn view(&self, record: CollectionRecord) -> ServiceResult<CollectionView> {
        let mut views = self.views(vec![record]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::internal(anyhow::anyhow!("record view went missing")))
    }

    /// Open a new pending record on behalf of `actor`
    pub async fn create(
        &self,
        actor: &User,
        draft: CollectionDraft,
    ) -> ServiceResult<CollectionRecord> {
        ensure_role(actor, Operation::CreateCollection)?;
        let record = self.records.insert(draft.validate(actor.id)?).await?;
        info!(record_id = %record.id, creator_id = %actor.id, waste_type = %record.waste_type, "Created collection record");
        Ok(record)
    }

    /// One record, visible to admins, its creator and its assignee
    pub async fn get(&self, actor: &User, id: Uuid) -> ServiceResult<CollectionView> {
        ensure_role(actor, Operation::ViewCollection)?;
        let record = self.load(id).await?;

        let visible = actor.role == Role::Admin
            || record.creator_id == actor.id
            || record.assigned_personnel_id == Some(actor.id);
        if !visible {
            return Err(ServiceError::forbidden(
                "Not authorized to view this waste collection record",
            ));
        }
        self.view(record).await
    }

    pub async fn assign(
        &self,
        actor: &User,
        id: Uuid,
        personnel_id: Option<Uuid>,
    ) -> ServiceResult<CollectionView> {
        ensure_role(actor, Operation::AssignCollection)?;
        self.load(id).await?;
        let personnel = resolve_personnel(self.users.as_ref(), personnel_id).await?;

        let record = self
            .records
            .assign_personnel(id, personnel.id, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::not_found(RECORD_NOT_FOUND))?;
        info!(record_id = %record.id, personnel_id = %personnel.id, admin_id = %actor.id, "Assigned personnel to collection record");

        self.notifier
            .notify(
                "Collection assignment",
                &format!(
                    "{}, you have been assigned a {} collection at {}",
                    personnel.name, record.waste_type, record.location
                ),
            )
            .await;

        self.view(record).await
    }

    /// Move a record to `status`. Re-applying the current status is a no-op.
    pub async fn update_status(
        &self,
        actor: &User,
        id: Uuid,
        status: Option<&str>,
    ) -> ServiceResult<CollectionRecord> {
        ensure_role(actor, Operation::UpdateCollectionStatus)?;
        let record = self.load(id).await?;
        ensure_assignee(actor, record.assigned_personnel_id)?;

        let status = parse_status(status)?;
        if !record.status.transition(status)? {
            return Ok(record);
        }

        let record = self.write_status(id, status).await?;
        info!(record_id = %record.id, actor_id = %actor.id, status = %status, "Updated collection status");

        self.notifier
            .notify(
                "Collection status updated",
                &format!(
                    "Your collection at {} is now {}",
                    record.location, record.status
                ),
            )
            .await;

        Ok(record)
    }

    /// Flag a record as missed
    pub async fn record_missed(&self, actor: &User, id: Uuid) -> ServiceResult<CollectionRecord> {
        ensure_role(actor, Operation::RecordMissed)?;
        let record = self.load(id).await?;

        if !record.status.transition(CollectionStatus::Missed)? {
            return Ok(record);
        }

        let record = self.write_status(id, CollectionStatus::Missed).await?;
        info!(record_id = %record.id, admin_id = %actor.id, "Recorded missed collection");
        Ok(record)
    }

    /// Remove a record. Only its creator or an admin may.
    pub async fn delete(&self, actor: &User, id: Uuid) -> ServiceResult<()> {
        ensure_role(actor, Operation::DeleteCollection)?;
        let record = self.load(id).await?;

        if actor.role != Role::Admin && record.creator_id != actor.id {
            return Err(ServiceError::forbidden(
                "Not authorized to delete this waste collection record",
            ));
        }

        if !self.records.delete(id).await? {
            return Err(ServiceError::not_found(RECORD_NOT_FOUND));
        }
        info!(record_id = %id, actor_id = %actor.id, "Deleted collection record");
        Ok(())
    }

    /// Records created by `user_id`. Admins may list anyone's.
    pub async fn list_for_user(
        &self,
        actor: &User,
        user_id: Uuid,
    ) -> ServiceResult<Vec<CollectionView>> {
        ensure_role(actor, Operation::ListUserCollections)?;
        if actor.role != Role::Admin && actor.id != user_id {
            return Err(ServiceError::forbidden(
                "Not authorized to view another user's collection records",
            ));
        }

        let records = self.records.list_by_creator(user_id).await?;
        self.views(records).await
    }

    pub async fn list_all(&self, actor: &User) -> ServiceResult<Vec<CollectionView>> {
        ensure_role(actor, Operation::ListAllCollections)?;
        let records = self.records.list_all().await?;
        self.views(records).await
    }

    /// Resolve a `User:<id>` card code to the user and their records
    pub async fn scan(&self, actor: &User, code: Option<&str>) -> ServiceResult<ScanResult> {
        ensure_role(actor, Operation::ScanCode)?;
        let raw_id = code
            .map(str::trim)
            .and_then(|c| c.strip_prefix(QR_PREFIX))
            .ok_or_else(|| ServiceError::validation("Invalid QR code"))?;

        let user_not_found = || ServiceError::not_found("User not found");
        let user_id = raw_id.trim().parse::<Uuid>().map_err(|_| user_not_found())?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(user_not_found)?;

        let waste_collections = self.records.list_by_creator(user.id).await?;
        info!(user_id = %user.id, personnel_id = %actor.id, "Scanned collection card");

        Ok(ScanResult {
            user: user.summary(),
            waste_collections,
        })
    }

    /// Records dated today or later
    pub async fn daily_summary(
        &self,
        actor: &User,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<CollectionView>> {
        ensure_role(actor, Operation::DailySummary)?;
        let records = self
            .records
            .list_dated(analytics::start_of_day(now), None)
            .await?;
        self.views(records).await
    }

    pub async fn analytics(&self, actor: &User, now: DateTime<Utc>) -> ServiceResult<Analytics> {
        ensure_role(actor, Operation::ViewAnalytics)?;
        let records = self
            .records
            .list_dated(analytics::window_start(now), None)
            .await?;
        Ok(analytics::summarize(&records, now))
    }
}

//! Advance-planning schedules

use auth::UserSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::CollectionStatus;

/// A planned collection for an area on a given date
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    /// User the collection is planned for
    pub user_id: Uuid,
    pub created_by: Uuid,
    pub scheduled_date: DateTime<Utc>,
    pub status: CollectionStatus,
    pub area: String,
    pub notes: Option<String>,
    pub assigned_personnel_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(
        user_id: Uuid,
        created_by: Uuid,
        scheduled_date: DateTime<Utc>,
        area: String,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            created_by,
            scheduled_date,
            status: CollectionStatus::Pending,
            area,
            notes,
            assigned_personnel_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A schedule with its user and assignee resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub user: Option<UserSummary>,
    pub assigned_personnel: Option<UserSummary>,
}

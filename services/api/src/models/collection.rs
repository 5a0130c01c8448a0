//! Collection records and the status they move through

use auth::UserSummary;
use chrono::{DateTime, Utc};
use common::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Status of a collection record or schedule.
///
/// `Pending` is the only state with outgoing transitions. Re-applying the
/// current status is accepted and changes nothing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "collection_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    #[default]
    Pending,
    Completed,
    Missed,
}

impl CollectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Missed => "missed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Check a transition to `next`. `Ok(false)` when nothing would change.
    pub fn transition(self, next: CollectionStatus) -> ServiceResult<bool> {
        if self == next {
            return Ok(false);
        }
        if self.is_terminal() {
            return Err(ServiceError::validation(format!(
                "Cannot change status from {} to {}",
                self, next
            )));
        }
        Ok(true)
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "missed" => Ok(Self::Missed),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

/// Waste category of a collection record
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "waste_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Organic,
    Plastic,
    Paper,
    Metal,
    Glass,
    Other,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 6] = [
        Self::Organic,
        Self::Plastic,
        Self::Paper,
        Self::Metal,
        Self::Glass,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organic => "organic",
            Self::Plastic => "plastic",
            Self::Paper => "paper",
            Self::Metal => "metal",
            Self::Glass => "glass",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WasteCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Invalid waste type: {}", s.trim()))
    }
}

/// One waste pickup request
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub location: String,
    pub waste_type: WasteCategory,
    /// Kilograms
    pub quantity: f64,
    pub status: CollectionStatus,
    /// Mirrors `status == Missed`
    pub missed: bool,
    pub assigned_personnel_id: Option<Uuid>,
    pub collection_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionRecord {
    pub fn new(
        creator_id: Uuid,
        location: String,
        waste_type: WasteCategory,
        quantity: f64,
        collection_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            creator_id,
            location,
            waste_type,
            quantity,
            status: CollectionStatus::Pending,
            missed: false,
            assigned_personnel_id: None,
            collection_date: collection_date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the status, keeping the missed flag in step
    pub fn set_status(&mut self, status: CollectionStatus) {
        self.status = status;
        self.missed = status == CollectionStatus::Missed;
    }
}

/// A collection record with its creator and assignee resolved for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionView {
    #[serde(flatten)]
    pub record: CollectionRecord,
    pub creator: Option<UserSummary>,
    pub assigned_personnel: Option<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_moves() {
        use CollectionStatus::*;
        assert!(Pending.transition(Completed).unwrap());
        assert!(Pending.transition(Missed).unwrap());
        assert!(!Completed.transition(Completed).unwrap());
        assert!(Completed.transition(Missed).is_err());
        assert!(Missed.transition(Pending).is_err());
    }

    #[test]
    fn parses_categories_case_insensitively() {
        assert_eq!("Organic".parse::<WasteCategory>(), Ok(WasteCategory::Organic));
        assert!("rubble".parse::<WasteCategory>().is_err());
        assert!("done".parse::<CollectionStatus>().is_err());
    }

    #[test]
    fn missed_flag_follows_status() {
        let mut record =
            CollectionRecord::new(Uuid::new_v4(), "Colombo".into(), WasteCategory::Paper, 2.0, None);
        assert!(!record.missed);
        record.set_status(CollectionStatus::Missed);
        assert!(record.missed);
        record.set_status(CollectionStatus::Completed);
        assert!(!record.missed);
    }

    #[test]
    fn view_serializes_flat_camel_case() {
        let record =
            CollectionRecord::new(Uuid::new_v4(), "Kandy".into(), WasteCategory::Glass, 1.5, None);
        let json = serde_json::to_value(CollectionView {
            record,
            creator: None,
            assigned_personnel: None,
        })
        .unwrap();
        assert_eq!(json["wasteType"], "glass");
        assert_eq!(json["status"], "pending");
        assert!(json["assignedPersonnel"].is_null());
    }
}

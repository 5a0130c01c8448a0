//! Advance-planning schedules
//!
//! Schedules follow the same status rules and assignment checks as
//! collection records.

use auth::{Operation, User, ensure_role, repositories::IdentityStore};
use chrono::{DateTime, Utc};
use common::{ServiceError, ServiceResult};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    lifecycle::{ensure_assignee, parse_status, resolve_personnel, summaries},
    models::{CollectionStatus, Schedule, ScheduleView},
    notify::Notifier,
    repositories::ScheduleStore,
};

const SCHEDULE_NOT_FOUND: &str = "Schedule not found";

#[derive(Debug, Clone, Default)]
pub struct ScheduleDraft {
    pub scheduled_date: Option<DateTime<Utc>>,
    pub area: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct ScheduleService {
    schedules: Arc<dyn ScheduleStore>,
    users: Arc<dyn IdentityStore>,
    notifier: Arc<dyn Notifier>,
}

impl ScheduleService {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        users: Arc<dyn IdentityStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            schedules,
            users,
            notifier,
        }
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Schedule> {
        self.schedules
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(SCHEDULE_NOT_FOUND))
    }

    async fn write_status(&self, id: Uuid, status: CollectionStatus) -> ServiceResult<Schedule> {
        if let Some(schedule) = self.schedules.set_status(id, status, Utc::now()).await? {
            return Ok(schedule);
        }

        let current = self.load(id).await?;
        current.status.transition(status)?;
        Ok(current)
    }

    pub async fn create(&self, actor: &User, draft: ScheduleDraft) -> ServiceResult<Schedule> {
        ensure_role(actor, Operation::CreateSchedule)?;
        let scheduled_date = draft
            .scheduled_date
            .ok_or_else(|| ServiceError::validation("Scheduled date is required"))?;
        let area = draft
            .area
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ServiceError::validation("Area is required"))?;
        let notes = draft
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let schedule = self
            .schedules
            .insert(Schedule::new(actor.id, actor.id, scheduled_date, area, notes))
            .await?;
        info!(schedule_id = %schedule.id, user_id = %actor.id, "Created schedule");

        self.notifier
            .notify(
                "New schedule created",
                &format!(
                    "Waste collection scheduled on {} for area {}",
                    schedule.scheduled_date.date_naive(),
                    schedule.area
                ),
            )
            .await;

        Ok(schedule)
    }

    pub async fn list(&self, actor: &User) -> ServiceResult<Vec<ScheduleView>> {
        ensure_role(actor, Operation::ListSchedules)?;
        let schedules = self.schedules.list_all().await?;

        let ids = schedules
            .iter()
            .flat_map(|s| std::iter::once(s.user_id).chain(s.assigned_personnel_id));
        let users = summaries(self.users.as_ref(), ids).await?;

        Ok(schedules
            .into_iter()
            .map(|schedule| ScheduleView {
                user: users.get(&schedule.user_id).cloned(),
                assigned_personnel: schedule
                    .assigned_personnel_id
                    .and_then(|id| users.get(&id).cloned()),
                schedule,
            })
            .collect())
    }

    pub async fn update_status(
        &self,
        actor: &User,
        id: Uuid,
        status: Option<&str>,
    ) -> ServiceResult<Schedule> {
        ensure_role(actor, Operation::UpdateScheduleStatus)?;
        let schedule = self.load(id).await?;
        ensure_assignee(actor, schedule.assigned_personnel_id)?;

        let status = parse_status(status)?;
        if !schedule.status.transition(status)? {
            return Ok(schedule);
        }

        let schedule = self.write_status(id, status).await?;
        info!(schedule_id = %schedule.id, actor_id = %actor.id, status = %status, "Updated schedule status");

        self.notifier
            .notify(
                "Schedule status updated",
                &format!(
                    "Your waste collection schedule for {} is now {}",
                    schedule.scheduled_date.date_naive(),
                    schedule.status
                ),
            )
            .await;

        Ok(schedule)
    }

    pub async fn assign(
        &self,
        actor: &User,
        id: Uuid,
        personnel_id: Option<Uuid>,
    ) -> ServiceResult<Schedule> {
        ensure_role(actor, Operation::AssignSchedule)?;
        self.load(id).await?;
        let personnel = resolve_personnel(self.users.as_ref(), personnel_id).await?;

        let schedule = self
            .schedules
            .assign_personnel(id, personnel.id, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::not_found(SCHEDULE_NOT_FOUND))?;
        info!(schedule_id = %schedule.id, personnel_id = %personnel.id, "Assigned personnel to schedule");

        self.notifier
            .notify(
                "Schedule assignment",
                &format!(
                    "{}, you have been assigned to a new schedule on {} for area {}",
                    personnel.name,
                    schedule.scheduled_date.date_naive(),
                    schedule.area
                ),
            )
            .await;

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{notify::RecordingNotifier, repositories::MemoryScheduleRepository};
    use auth::{
        Role,
        models::NewUser,
        repositories::{IdentityStore, MemoryUserRepository},
    };

    async fn user(store: &MemoryUserRepository, name: &str, role: Role) -> User {
        store
            .create(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".to_string(),
                role,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn schedule_lifecycle_mirrors_collections() {
        let users = MemoryUserRepository::new();
        let admin = user(&users, "Admin", Role::Admin).await;
        let citizen = user(&users, "Nimal", Role::Citizen).await;
        let personnel = user(&users, "Ravi", Role::Personnel).await;
        let notifier = RecordingNotifier::new();
        let service = ScheduleService::new(
            Arc::new(MemoryScheduleRepository::new()),
            Arc::new(users),
            Arc::new(notifier.clone()),
        );

        let schedule = service
            .create(
                &citizen,
                ScheduleDraft {
                    scheduled_date: Some(Utc::now()),
                    area: Some("Negombo".to_string()),
                    notes: Some("  ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(schedule.status, CollectionStatus::Pending);
        assert_eq!(schedule.notes, None);

        let err = service
            .update_status(&personnel, schedule.id, Some("completed"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));

        service
            .assign(&admin, schedule.id, Some(personnel.id))
            .await
            .unwrap();
        let done = service
            .update_status(&personnel, schedule.id, Some("completed"))
            .await
            .unwrap();
        assert_eq!(done.status, CollectionStatus::Completed);

        let listed = service.list(&admin).await.unwrap();
        assert_eq!(listed[0].user.as_ref().unwrap().name, "Nimal");
        assert_eq!(listed[0].assigned_personnel.as_ref().unwrap().name, "Ravi");

        let subjects: Vec<_> = notifier.sent().into_iter().map(|(s, _)| s).collect();
        assert_eq!(
            subjects,
            vec![
                "New schedule created",
                "Schedule assignment",
                "Schedule status updated"
            ]
        );
    }

    #[tokio::test]
    async fn closed_schedule_is_not_reopened_by_assignment() {
        let users = MemoryUserRepository::new();
        let admin = user(&users, "Admin", Role::Admin).await;
        let personnel = user(&users, "Ravi", Role::Personnel).await;
        let schedules = Arc::new(MemoryScheduleRepository::new());
        let service = ScheduleService::new(
            schedules.clone(),
            Arc::new(users),
            Arc::new(RecordingNotifier::new()),
        );
        let schedule = service
            .create(
                &admin,
                ScheduleDraft {
                    scheduled_date: Some(Utc::now()),
                    area: Some("Kandy".to_string()),
                    notes: None,
                },
            )
            .await
            .unwrap();

        service
            .update_status(&admin, schedule.id, Some("missed"))
            .await
            .unwrap();
        let assigned = service
            .assign(&admin, schedule.id, Some(personnel.id))
            .await
            .unwrap();
        assert_eq!(assigned.status, CollectionStatus::Missed);

        let err = service
            .update_status(&admin, schedule.id, Some("pending"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let stored = schedules.find_by_id(schedule.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CollectionStatus::Missed);
    }

    #[tokio::test]
    async fn create_requires_date_and_area() {
        let service = ScheduleService::new(
            Arc::new(MemoryScheduleRepository::new()),
            Arc::new(MemoryUserRepository::new()),
            Arc::new(RecordingNotifier::new()),
        );
        let users = MemoryUserRepository::new();
        let citizen = user(&users, "Nimal", Role::Citizen).await;

        let err = service
            .create(
                &citizen,
                ScheduleDraft {
                    area: Some("Negombo".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Scheduled date is required");
    }
}

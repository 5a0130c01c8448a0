//! Recycling credits, held as a running balance on each user

use auth::{Operation, User, ensure_role, repositories::IdentityStore};
use common::{ServiceError, ServiceResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    pub message: String,
    pub current_credits: i64,
}

#[derive(Clone)]
pub struct RecyclingLedger {
    users: Arc<dyn IdentityStore>,
}

impl RecyclingLedger {
    pub fn new(users: Arc<dyn IdentityStore>) -> Self {
        Self { users }
    }

    /// Increment a user's balance. The store applies the increment
    /// atomically, so concurrent additions are never lost.
    pub async fn add_credits(
        &self,
        actor: &User,
        user_id: Uuid,
        credits: Option<i64>,
    ) -> ServiceResult<CreditBalance> {
        ensure_role(actor, Operation::AddCredits)?;
        let credits = credits.ok_or_else(|| ServiceError::validation("Credits are required"))?;
        if credits <= 0 {
            return Err(ServiceError::validation("Credits must be a positive number"));
        }

        let user = self
            .users
            .add_credits(user_id, credits)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        info!(user_id = %user.id, admin_id = %actor.id, credits, balance = user.recycling_credits, "Added recycling credits");

        Ok(CreditBalance {
            message: format!("Successfully added {} recycling credits", credits),
            current_credits: user.recycling_credits,
        })
    }

    /// The actor's current balance
    pub async fn balance(&self, actor: &User) -> ServiceResult<i64> {
        ensure_role(actor, Operation::ViewCredits)?;
        let user = self
            .users
            .find_by_id(actor.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        Ok(user.recycling_credits)
    }
}

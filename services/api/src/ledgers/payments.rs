use auth::{Operation, Role, User, ensure_role, repositories::IdentityStore};
use common::{ServiceError, ServiceResult};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    lifecycle::summaries,
    models::{Payment, PaymentMethod, PaymentStatus, PaymentView},
    repositories::PaymentStore,
};

const PAYMENT_NOT_FOUND: &str = "Payment not found";

#[derive(Clone)]
pub struct PaymentLedger {
    payments: Arc<dyn PaymentStore>,
    users: Arc<dyn IdentityStore>,
}

impl PaymentLedger {
    pub fn new(payments: Arc<dyn PaymentStore>, users: Arc<dyn IdentityStore>) -> Self {
        Self { payments, users }
    }

    async fn views(&self, payments: Vec<Payment>) -> ServiceResult<Vec<PaymentView>> {
        let users = summaries(self.users.as_ref(), payments.iter().map(|p| p.user_id)).await?;
        Ok(payments
            .into_iter()
            .map(|payment| PaymentView {
                user: users.get(&payment.user_id).cloned(),
                payment,
            })
            .collect())
    }

    /// Record a payment made by `actor`
    pub async fn create(
        &self,
        actor: &User,
        amount: Option<f64>,
        method: Option<&str>,
    ) -> ServiceResult<Payment> {
        ensure_role(actor, Operation::CreatePayment)?;
        let amount = amount.ok_or_else(|| ServiceError::validation("Amount is required"))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ServiceError::validation("Amount must be greater than zero"));
        }
        let method = match method.map(str::trim) {
            Some(m) if !m.is_empty() => m.parse::<PaymentMethod>().map_err(ServiceError::Validation)?,
            _ => return Err(ServiceError::validation("Payment method is required")),
        };

        let payment = self.payments.insert(Payment::new(actor.id, amount, method)).await?;
        info!(payment_id = %payment.id, user_id = %actor.id, "Recorded payment");
        Ok(payment)
    }

    /// All payments for admins, the actor's own otherwise
    pub async fn list(&self, actor: &User) -> ServiceResult<Vec<PaymentView>> {
        ensure_role(actor, Operation::ListPayments)?;
        let owner = (actor.role != Role::Admin).then_some(actor.id);
        let payments = self.payments.list(owner).await?;
        self.views(payments).await
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> ServiceResult<PaymentView> {
        ensure_role(actor, Operation::ViewPayment)?;
        let payment = self
            .payments
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(PAYMENT_NOT_FOUND))?;

        if actor.role != Role::Admin && payment.user_id != actor.id {
            return Err(ServiceError::forbidden("Not authorized to access this payment"));
        }

        let mut views = self.views(vec![payment]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::not_found(PAYMENT_NOT_FOUND))
    }

    pub async fn update_status(
        &self,
        actor: &User,
        id: Uuid,
        status: Option<&str>,
    ) -> ServiceResult<Payment> {
        ensure_role(actor, Operation::UpdatePaymentStatus)?;
        let status = match status.map(str::trim) {
            Some(s) if !s.is_empty() => s.parse::<PaymentStatus>().map_err(ServiceError::Validation)?,
            _ => return Err(ServiceError::validation("Status is required")),
        };

        let payment = self
            .payments
            .set_status(id, status)
            .await?
            .ok_or_else(|| ServiceError::not_found(PAYMENT_NOT_FOUND))?;
        info!(payment_id = %id, admin_id = %actor.id, status = ?status, "Updated payment status");
        Ok(payment)
    }

    pub async fn delete(&self, actor: &User, id: Uuid) -> ServiceResult<()> {
        ensure_role(actor, Operation::DeletePayment)?;
        if !self.payments.delete(id).await? {
            return Err(ServiceError::not_found(PAYMENT_NOT_FOUND));
        }
        info!(payment_id = %id, admin_id = %actor.id, "Deleted payment");
        Ok(())
    }
}

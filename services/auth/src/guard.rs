//! Authorization guard: token + allowed roles in, authenticated user out

use common::{ServiceError, ServiceResult};
use tracing::debug;

use crate::{
    credentials::CredentialService,
    models::{RoleSet, User},
    policy::Operation,
};

/// Stateless gate in front of every private operation
#[derive(Clone)]
pub struct AuthorizationGuard {
    credentials: CredentialService,
}

impl AuthorizationGuard {
    pub fn new(credentials: CredentialService) -> Self {
        Self { credentials }
    }

    /// Verify `token`, load its user and check the user's current role.
    ///
    /// The role stored on the user wins over the one embedded in the token,
    /// so a role change takes effect on the next request.
    pub async fn authorize(&self, token: Option<&str>, allowed: RoleSet) -> ServiceResult<User> {
        let token = token.ok_or_else(|| ServiceError::unauthenticated("Not authorized, no token"))?;
        let identity = self.credentials.verify(token)?;

        let user = self
            .credentials
            .users()
            .find_by_id(identity.user_id)
            .await?
            .ok_or_else(|| ServiceError::unauthenticated("Not authorized, user not found"))?;

        if !allowed.contains(user.role) {
            debug!(user_id = %user.id, role = %user.role, "Role rejected by guard");
            return Err(role_rejected(&user));
        }

        Ok(user)
    }

    /// [`Self::authorize`] against the role set of a policy operation
    pub async fn authorize_operation(
        &self,
        token: Option<&str>,
        operation: Operation,
    ) -> ServiceResult<User> {
        self.authorize(token, operation.allowed_roles()).await
    }
}

fn role_rejected(user: &User) -> ServiceError {
    ServiceError::forbidden(format!(
        "User role {} is not authorized to access this route",
        user.role
    ))
}

/// Role check for an already authenticated actor
pub fn ensure_role(actor: &User, operation: Operation) -> ServiceResult<()> {
    if operation.allowed_roles().contains(actor.role) {
        Ok(())
    } else {
        Err(role_rejected(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jwt::{JwtConfig, JwtService},
        models::{Role, UpdateUser},
        repositories::{IdentityStore, MemoryUserRepository},
    };
    use std::sync::Arc;

    async fn setup() -> (AuthorizationGuard, CredentialService) {
        let credentials = CredentialService::new(
            Arc::new(MemoryUserRepository::new()),
            JwtService::new(JwtConfig {
                secret: "guard-tests".to_string(),
                token_expiry: 60,
            }),
        );
        (AuthorizationGuard::new(credentials.clone()), credentials)
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated() {
        let (guard, _) = setup().await;
        let err = guard.authorize(None, RoleSet::ANY).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authentication(_)));
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let (guard, credentials) = setup().await;
        let session = credentials
            .register("Citizen", "c@example.com", "password123", None)
            .await
            .unwrap();

        let err = guard
            .authorize_operation(Some(&session.token), Operation::AssignCollection)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
    }

    #[tokio::test]
    async fn stored_role_overrides_token_role() {
        let (guard, credentials) = setup().await;
        let session = credentials
            .register("Soon Admin", "a@example.com", "password123", None)
            .await
            .unwrap();
        credentials
            .users()
            .update(session.user.id, UpdateUser::role(Role::Admin))
            .await
            .unwrap();

        let user = guard
            .authorize_operation(Some(&session.token), Operation::AddCredits)
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn deleted_user_token_is_unauthenticated() {
        let (guard, credentials) = setup().await;
        let session = credentials
            .register("Gone", "g@example.com", "password123", None)
            .await
            .unwrap();
        credentials.users().delete(session.user.id).await.unwrap();

        let err = guard
            .authorize(Some(&session.token), RoleSet::ANY)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authentication(_)));
    }
}

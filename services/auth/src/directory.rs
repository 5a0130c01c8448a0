//! User management: self-service profile and admin CRUD

use common::{ServiceError, ServiceResult};
use tracing::info;
use uuid::Uuid;

use crate::{
    credentials::{AuthSession, CredentialService, hash_password},
    guard::ensure_role,
    models::{Role, UpdateUser, User},
    policy::Operation,
    validation::{validate_email, validate_name, validate_password},
};

/// Requested changes to a user. Blank strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl UserChanges {
    /// Validate and hash into a store update
    fn into_update(self) -> ServiceResult<UpdateUser> {
        let name = present(self.name);
        if let Some(name) = &name {
            validate_name(name)?;
        }

        let email = present(self.email).map(|e| e.to_lowercase());
        if let Some(email) = &email {
            validate_email(email)?;
        }

        let password_hash = match self.password.filter(|p| !p.is_empty()) {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        Ok(UpdateUser {
            name,
            email,
            password_hash,
            role: self.role,
        })
    }
}

fn user_not_found() -> ServiceError {
    ServiceError::not_found("User not found")
}

#[derive(Clone)]
pub struct UserDirectory {
    credentials: CredentialService,
}

impl UserDirectory {
    pub fn new(credentials: CredentialService) -> Self {
        Self { credentials }
    }

    /// The actor's own record, as currently stored
    pub async fn profile(&self, actor: &User) -> ServiceResult<User> {
        ensure_role(actor, Operation::ViewProfile)?;
        self.credentials
            .users()
            .find_by_id(actor.id)
            .await?
            .ok_or_else(user_not_found)
    }

    /// Change the actor's own name, email or password. The role cannot be
    /// changed this way. Returns a fresh token.
    pub async fn update_profile(
        &self,
        actor: &User,
        changes: UserChanges,
    ) -> ServiceResult<AuthSession> {
        ensure_role(actor, Operation::UpdateProfile)?;
        let update = UserChanges {
            role: None,
            ..changes
        }
        .into_update()?;

        let user = self
            .credentials
            .users()
            .update(actor.id, update)
            .await?
            .ok_or_else(user_not_found)?;
        info!(user_id = %user.id, "Updated own profile");

        let token = self.credentials.issue_token(&user)?;
        Ok(AuthSession { user, token })
    }

    pub async fn list(&self, actor: &User) -> ServiceResult<Vec<User>> {
        ensure_role(actor, Operation::ListUsers)?;
        self.credentials.users().list(None).await
    }

    pub async fn personnel(&self, actor: &User) -> ServiceResult<Vec<User>> {
        ensure_role(actor, Operation::ListPersonnel)?;
        self.credentials.users().list(Some(Role::Personnel)).await
    }

    /// Admin-side registration with an explicit role
    pub async fn create(
        &self,
        actor: &User,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> ServiceResult<AuthSession> {
        ensure_role(actor, Operation::CreateUser)?;
        let session = self
            .credentials
            .register(name, email, password, Some(role))
            .await?;
        info!(admin_id = %actor.id, user_id = %session.user.id, role = %role, "Admin created user");
        Ok(session)
    }

    pub async fn add_personnel(
        &self,
        actor: &User,
        name: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<User> {
        ensure_role(actor, Operation::AddPersonnel)?;
        let session = self
            .credentials
            .register(name, email, password, Some(Role::Personnel))
            .await?;
        info!(admin_id = %actor.id, user_id = %session.user.id, "Added personnel");
        Ok(session.user)
    }

    pub async fn update(&self, actor: &User, id: Uuid, changes: UserChanges) -> ServiceResult<User> {
        ensure_role(actor, Operation::UpdateUser)?;
        let user = self
            .credentials
            .users()
            .update(id, changes.into_update()?)
            .await?
            .ok_or_else(user_not_found)?;
        info!(admin_id = %actor.id, user_id = %id, "Admin updated user");
        Ok(user)
    }

    pub async fn change_role(&self, actor: &User, id: Uuid, role: Role) -> ServiceResult<User> {
        ensure_role(actor, Operation::ChangeRole)?;
        let user = self
            .credentials
            .users()
            .update(id, UpdateUser::role(role))
            .await?
            .ok_or_else(user_not_found)?;
        info!(admin_id = %actor.id, user_id = %id, role = %role, "Changed user role");
        Ok(user)
    }

    pub async fn delete(&self, actor: &User, id: Uuid) -> ServiceResult<()> {
        ensure_role(actor, Operation::DeleteUser)?;
        if !self.credentials.users().delete(id).await? {
            return Err(user_not_found());
        }
        info!(admin_id = %actor.id, user_id = %id, "Deleted user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        credentials::verify_password,
        jwt::{JwtConfig, JwtService},
        repositories::MemoryUserRepository,
    };
    use std::sync::Arc;

    async fn setup() -> (UserDirectory, User, User) {
        let credentials = CredentialService::new(
            Arc::new(MemoryUserRepository::new()),
            JwtService::new(JwtConfig {
                secret: "directory-tests".to_string(),
                token_expiry: 60,
            }),
        );
        let admin = credentials
            .register("Admin", "admin@example.com", "password123", Some(Role::Admin))
            .await
            .unwrap()
            .user;
        let citizen = credentials
            .register("Citizen", "citizen@example.com", "password123", None)
            .await
            .unwrap()
            .user;
        (UserDirectory::new(credentials), admin, citizen)
    }

    #[tokio::test]
    async fn citizen_cannot_change_roles() {
        let (directory, _, citizen) = setup().await;
        let err = directory
            .change_role(&citizen, citizen.id, Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
        assert_eq!(directory.profile(&citizen).await.unwrap().role, Role::Citizen);
    }

    #[tokio::test]
    async fn profile_update_ignores_role_and_rehashes_password() {
        let (directory, _, citizen) = setup().await;
        let session = directory
            .update_profile(
                &citizen,
                UserChanges {
                    name: Some("Renamed".to_string()),
                    password: Some("new-password".to_string()),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(session.user.name, "Renamed");
        assert_eq!(session.user.role, Role::Citizen);
        assert!(verify_password("new-password", &session.user.password_hash));
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn blank_fields_leave_values_unchanged() {
        let (directory, admin, citizen) = setup().await;
        let updated = directory
            .update(
                &admin,
                citizen.id,
                UserChanges {
                    name: Some("  ".to_string()),
                    email: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Citizen");
        assert_eq!(updated.email, "citizen@example.com");
    }

    #[tokio::test]
    async fn personnel_listing_may_be_empty() {
        let (directory, admin, _) = setup().await;
        assert!(directory.personnel(&admin).await.unwrap().is_empty());

        directory
            .add_personnel(&admin, "Field", "field@example.com", "password123")
            .await
            .unwrap();
        let personnel = directory.personnel(&admin).await.unwrap();
        assert_eq!(personnel.len(), 1);
        assert_eq!(personnel[0].role, Role::Personnel);
    }

    #[tokio::test]
    async fn deleting_missing_user_is_not_found() {
        let (directory, admin, _) = setup().await;
        let err = directory.delete(&admin, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}

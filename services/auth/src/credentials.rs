//! Credential service: registration, login and token verification

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use common::{ServiceError, ServiceResult};
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    jwt::JwtService,
    models::{NewUser, Role, User},
    repositories::IdentityStore,
    validation::{validate_email, validate_name, validate_password},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Salted argon2 hash of a password
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

/// Check a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// Compared against when no account matches, so a miss costs one argon2
/// verification like a wrong password does
static ABSENT_USER_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("absent-user-password").unwrap_or_default());

/// Identity proven by a valid token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

/// A user together with a freshly issued bearer token
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Registration, login and token verification over an identity store
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn IdentityStore>,
    jwt: JwtService,
}

impl CredentialService {
    pub fn new(users: Arc<dyn IdentityStore>, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    pub fn users(&self) -> &Arc<dyn IdentityStore> {
        &self.users
    }

    /// Create a user and issue a token.
    ///
    /// The role defaults to citizen. Fails with `Conflict` when the email is
    /// already registered in any letter case.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> ServiceResult<AuthSession> {
        validate_name(name)?;
        validate_email(email)?;
        validate_password(password)?;

        if self.users.find_by_email(email).await?.is_some() {
            return Err(ServiceError::Conflict("User already exists".to_string()));
        }

        let user = self
            .users
            .create(NewUser {
                name: name.trim().to_string(),
                email: email.to_lowercase(),
                password_hash: hash_password(password)?,
                role: role.unwrap_or_default(),
            })
            .await?;
        info!(user_id = %user.id, role = %user.role, "Registered user");

        let token = self.issue_token(&user)?;
        Ok(AuthSession { user, token })
    }

    /// Authenticate by email and password.
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        let found = self.users.find_by_email(email).await?;
        let hash = found
            .as_ref()
            .map_or(ABSENT_USER_HASH.as_str(), |u| u.password_hash.as_str());
        let verified = verify_password(password, hash);

        let user = match found {
            Some(user) if verified => user,
            _ => {
                info!("Rejected login attempt");
                return Err(ServiceError::unauthenticated(INVALID_CREDENTIALS));
            }
        };

        info!(user_id = %user.id, "User logged in");
        let token = self.issue_token(&user)?;
        Ok(AuthSession { user, token })
    }

    /// Check a bearer token's signature and expiry
    pub fn verify(&self, token: &str) -> ServiceResult<Identity> {
        let claims = self
            .jwt
            .validate_token(token)
            .map_err(|_| ServiceError::unauthenticated("Not authorized, token failed"))?;

        Ok(Identity {
            user_id: claims.sub,
            role: claims.role,
        })
    }

    pub fn issue_token(&self, user: &User) -> ServiceResult<String> {
        self.jwt.generate_token(user).map_err(ServiceError::internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{jwt::JwtConfig, repositories::MemoryUserRepository};

    fn service() -> CredentialService {
        CredentialService::new(
            Arc::new(MemoryUserRepository::new()),
            JwtService::new(JwtConfig {
                secret: "credential-tests".to_string(),
                token_expiry: 60,
            }),
        )
    }

    #[test]
    fn hash_is_salted_and_verifiable() {
        let a = hash_password("correct horse").unwrap();
        let b = hash_password("correct horse").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("correct horse"));
        assert!(verify_password("correct horse", &a));
        assert!(!verify_password("wrong horse", &a));
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[tokio::test]
    async fn register_defaults_to_citizen_and_issues_token() {
        let credentials = service();
        let session = credentials
            .register("Amara", "Amara@Example.com", "password123", None)
            .await
            .unwrap();

        assert_eq!(session.user.role, Role::Citizen);
        assert_eq!(session.user.email, "amara@example.com");
        let identity = credentials.verify(&session.token).unwrap();
        assert_eq!(identity.user_id, session.user.id);
        assert_eq!(identity.role, Role::Citizen);
    }

    #[test]
    fn unknown_emails_verify_against_a_real_hash() {
        assert!(PasswordHash::new(&ABSENT_USER_HASH).is_ok());
        assert!(!verify_password("password123", &ABSENT_USER_HASH));
        assert!(!verify_password("absent-user-password-", &ABSENT_USER_HASH));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_in_any_case() {
        let credentials = service();
        credentials
            .register("Amara", "amara@example.com", "password123", None)
            .await
            .unwrap();

        let err = credentials
            .register("Other", "AMARA@example.com", "password456", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let err = service()
            .register("Amara", "not-an-email", "password123", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let credentials = service();
        credentials
            .register("Amara", "amara@example.com", "password123", None)
            .await
            .unwrap();

        let wrong_password = credentials
            .login("amara@example.com", "password999")
            .await
            .unwrap_err();
        let unknown_user = credentials
            .login("nobody@example.com", "password123")
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), INVALID_CREDENTIALS);
        assert_eq!(unknown_user.to_string(), INVALID_CREDENTIALS);
        assert!(matches!(wrong_password, ServiceError::Authentication(_)));
        assert!(matches!(unknown_user, ServiceError::Authentication(_)));
    }

    #[tokio::test]
    async fn login_is_case_insensitive_on_email() {
        let credentials = service();
        credentials
            .register("Amara", "amara@example.com", "password123", None)
            .await
            .unwrap();

        assert!(credentials
            .login("AMARA@EXAMPLE.COM", "password123")
            .await
            .is_ok());
    }

    #[test]
    fn verify_rejects_garbage() {
        let err = service().verify("garbage").unwrap_err();
        assert!(matches!(err, ServiceError::Authentication(_)));
    }
}

//! Identity store: user records, credential hashes, roles and credit balances

use async_trait::async_trait;
use chrono::Utc;
use common::{ServiceError, ServiceResult};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, Role, UpdateUser, User};

const DUPLICATE_EMAIL: &str = "User already exists";

/// Data-access contract for users
///
/// Emails are compared case-insensitively and stored lower-cased.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Persist a new user. Fails with `Conflict` when the email is taken.
    async fn create(&self, new_user: NewUser) -> ServiceResult<User>;

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>>;

    /// Users with the given ids; unknown ids are skipped
    async fn find_many(&self, ids: &[Uuid]) -> ServiceResult<Vec<User>>;

    /// All users in creation order, optionally restricted to one role
    async fn list(&self, role: Option<Role>) -> ServiceResult<Vec<User>>;

    /// Apply the present fields. `Ok(None)` when the user does not exist.
    async fn update(&self, id: Uuid, changes: UpdateUser) -> ServiceResult<Option<User>>;

    async fn delete(&self, id: Uuid) -> ServiceResult<bool>;

    /// Atomically add `credits` to the balance and return the updated user
    async fn add_credits(&self, id: Uuid, credits: i64) -> ServiceResult<Option<User>>;
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, recycling_credits, created_at, updated_at";

/// PostgreSQL-backed identity store
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error) -> ServiceError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ServiceError::Conflict(DUPLICATE_EMAIL.to_string())
        }
        _ => err.into(),
    }
}

#[async_trait]
impl IdentityStore for UserRepository {
    async fn create(&self, new_user: NewUser) -> ServiceResult<User> {
        info!("Creating new user: {}", new_user.email);

        let query = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, lower($3), $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(new_user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_many(&self, ids: &[Uuid]) -> ServiceResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");

        let users = sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn list(&self, role: Option<Role>) -> ServiceResult<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::user_role IS NULL OR role = $1) ORDER BY created_at"
        );

        let users = sqlx::query_as::<_, User>(&query)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update(&self, id: Uuid, changes: UpdateUser) -> ServiceResult<Option<User>> {
        info!("Updating user: {}", id);

        let query = format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE(lower($3), email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.role)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        info!("Deleting user: {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_credits(&self, id: Uuid, credits: i64) -> ServiceResult<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET recycling_credits = recycling_credits + $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(credits)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

/// Process-local identity store
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &[User], email: &str, except: Option<Uuid>) -> bool {
    users
        .iter()
        .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl IdentityStore for MemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> ServiceResult<User> {
        let mut users = self.users.write().await;
        if email_taken(&users, &new_user.email, None) {
            return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email.to_lowercase(),
            password_hash: new_user.password_hash,
            role: new_user.role,
            recycling_credits: 0,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> ServiceResult<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list(&self, role: Option<Role>) -> ServiceResult<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, changes: UpdateUser) -> ServiceResult<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if email_taken(&users, email, Some(id)) {
                return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
            }
        }

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email.to_lowercase();
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }

    async fn add_credits(&self, id: Uuid, credits: i64) -> ServiceResult<Option<User>> {
        // The increment happens under the write lock, so concurrent callers
        // never observe the same starting balance.
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.recycling_credits += credits;
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn email_uniqueness_is_case_insensitive() {
        let store = MemoryUserRepository::new();
        store
            .create(new_user("Ann@Example.com", Role::Citizen))
            .await
            .unwrap();

        let err = store
            .create(new_user("ann@example.COM", Role::Citizen))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let found = store.find_by_email("ANN@example.com").await.unwrap();
        assert_eq!(found.unwrap().email, "ann@example.com");
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_user() {
        let store = MemoryUserRepository::new();
        store.create(new_user("a@example.com", Role::Citizen)).await.unwrap();
        let b = store.create(new_user("b@example.com", Role::Citizen)).await.unwrap();

        let err = store
            .update(
                b.id,
                UpdateUser {
                    email: Some("A@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // Keeping one's own email is not a conflict
        let same = store
            .update(
                b.id,
                UpdateUser {
                    email: Some("b@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn list_filters_by_role() {
        let store = MemoryUserRepository::new();
        store.create(new_user("c@example.com", Role::Citizen)).await.unwrap();
        store.create(new_user("p@example.com", Role::Personnel)).await.unwrap();

        let personnel = store.list(Some(Role::Personnel)).await.unwrap();
        assert_eq!(personnel.len(), 1);
        assert_eq!(personnel[0].email, "p@example.com");
        assert_eq!(store.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_credit_increments_are_not_lost() {
        let store = MemoryUserRepository::new();
        let user = store.create(new_user("u@example.com", Role::Citizen)).await.unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add_credits(user.id, 3).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let user = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.recycling_credits, 150);
    }

    #[tokio::test]
    async fn add_credits_to_missing_user_returns_none() {
        let store = MemoryUserRepository::new();
        assert!(store.add_credits(Uuid::new_v4(), 10).await.unwrap().is_none());
    }
}

//! Identity and access control for Wastewise
//!
//! Holds the identity store, issues and verifies bearer tokens, and decides
//! which role may perform which operation.

pub mod credentials;
pub mod directory;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod validation;

pub use credentials::{AuthSession, CredentialService, Identity};
pub use directory::{UserChanges, UserDirectory};
pub use guard::{AuthorizationGuard, ensure_role};
pub use middleware::Authorized;
pub use models::{Role, RoleSet, User, UserSummary};
pub use policy::{Operation, op};

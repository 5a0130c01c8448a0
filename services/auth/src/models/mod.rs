//! Identity models

pub mod role;
pub mod user;

// Re-export for convenience
pub use role::{Role, RoleSet};
pub use user::{NewUser, UpdateUser, User, UserSummary};

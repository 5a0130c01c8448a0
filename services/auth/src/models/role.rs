//! Role model and related functionality

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The closed set of roles a user can hold
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Resident requesting collections and making payments
    #[default]
    Citizen,
    /// Field staff executing assigned collections
    Personnel,
    /// Operator with full access
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Citizen, Role::Personnel, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Personnel => "personnel",
            Role::Admin => "admin",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "citizen" | "user" => Ok(Role::Citizen),
            "personnel" => Ok(Role::Personnel),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Set of roles permitted to perform an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    /// Every authenticated role
    pub const ANY: RoleSet = RoleSet::of(&Role::ALL);

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= roles[i].bit();
            i += 1;
        }
        RoleSet(bits)
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn roles(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |r| self.contains(*r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_set_membership() {
        let set = RoleSet::of(&[Role::Citizen, Role::Admin]);
        assert!(set.contains(Role::Citizen));
        assert!(set.contains(Role::Admin));
        assert!(!set.contains(Role::Personnel));
        assert_eq!(set.roles().collect::<Vec<_>>(), vec![Role::Citizen, Role::Admin]);
    }

    #[test]
    fn any_contains_every_role() {
        assert!(Role::ALL.iter().all(|r| RoleSet::ANY.contains(*r)));
    }

    #[test]
    fn parses_legacy_user_alias() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::Citizen);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("driver".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Personnel).unwrap(), "\"personnel\"");
    }
}

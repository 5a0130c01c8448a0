//! Who the client is acting as
//!
//! An [`AuthContext`] is owned by the caller and handed to every request.
//! Its lifecycle is `Uninitialized -> Loading -> Resolved | Anonymous`, and
//! any token change sends it back to `Loading` until the profile has been
//! fetched again.

use crate::models::{Profile, Role};

/// Resolution state of the signed-in user
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Nothing has been attempted yet
    Uninitialized,
    /// A token is held but its profile has not been fetched
    Loading,
    /// The token belongs to this user
    Resolved(Profile),
    /// No usable token
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct AuthContext {
    token: Option<String>,
    state: AuthState,
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthContext {
    pub fn new() -> Self {
        Self {
            token: None,
            state: AuthState::Uninitialized,
        }
    }

    /// A context restored from a previously issued token
    pub fn with_token(token: impl Into<String>) -> Self {
        let mut context = Self::new();
        context.set_token(Some(token.into()));
        context
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn user(&self) -> Option<&Profile> {
        match &self.state {
            AuthState::Resolved(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|profile| profile.role)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, AuthState::Loading)
    }

    /// Replace the token. Clearing it signs the context out.
    pub fn set_token(&mut self, token: Option<String>) {
        if token.is_some() && token == self.token && self.user().is_some() {
            return;
        }
        self.state = if token.is_some() {
            AuthState::Loading
        } else {
            AuthState::Anonymous
        };
        self.token = token;
    }

    /// Settle a pending profile fetch.
    ///
    /// `None` means the server rejected the token, which is then dropped.
    pub fn resolve(&mut self, profile: Option<Profile>) {
        match profile {
            Some(profile) if self.token.is_some() => self.state = AuthState::Resolved(profile),
            _ => {
                self.token = None;
                self.state = AuthState::Anonymous;
            }
        }
    }

    /// Settle a profile fetch that failed for a reason other than the token
    pub(crate) fn abandon(&mut self) {
        self.state = AuthState::Anonymous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn profile(role: Role) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            name: "Nimal".to_string(),
            email: "nimal@example.com".to_string(),
            role,
            recycling_credits: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn starts_uninitialized_without_token() {
        let context = AuthContext::new();
        assert_eq!(context.state(), &AuthState::Uninitialized);
        assert!(context.token().is_none());
        assert!(context.user().is_none());
    }

    #[test]
    fn token_moves_to_loading_until_resolved() {
        let mut context = AuthContext::with_token("abc");
        assert!(context.is_loading());

        context.resolve(Some(profile(Role::Personnel)));
        assert_eq!(context.role(), Some(Role::Personnel));
        assert_eq!(context.token(), Some("abc"));
    }

    #[test]
    fn new_token_invalidates_resolved_user() {
        let mut context = AuthContext::with_token("abc");
        context.resolve(Some(profile(Role::Citizen)));

        context.set_token(Some("def".to_string()));
        assert!(context.is_loading());
        assert!(context.user().is_none());
    }

    #[test]
    fn same_token_keeps_resolved_user() {
        let mut context = AuthContext::with_token("abc");
        context.resolve(Some(profile(Role::Citizen)));

        context.set_token(Some("abc".to_string()));
        assert_eq!(context.role(), Some(Role::Citizen));
    }

    #[test]
    fn rejected_token_is_dropped() {
        let mut context = AuthContext::with_token("expired");
        context.resolve(None);
        assert_eq!(context.state(), &AuthState::Anonymous);
        assert!(context.token().is_none());
    }

    #[test]
    fn clearing_token_signs_out() {
        let mut context = AuthContext::with_token("abc");
        context.resolve(Some(profile(Role::Admin)));

        context.set_token(None);
        assert_eq!(context.state(), &AuthState::Anonymous);
    }
}

//! Axum extractor running the authorization guard for a handler

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::ServiceError;
use std::{marker::PhantomData, ops::Deref};

use crate::{guard::AuthorizationGuard, models::User, policy::Guarded};

/// The caller of an operation `O`, admitted by the guard.
///
/// Declaring `actor: Authorized<op::AssignCollection>` on a handler is the
/// route's role requirement; the request never reaches the handler body
/// otherwise.
pub struct Authorized<O> {
    pub user: User,
    _operation: PhantomData<fn() -> O>,
}

impl<O> Authorized<O> {
    pub fn into_inner(self) -> User {
        self.user
    }
}

impl<O> Deref for Authorized<O> {
    type Target = User;

    fn deref(&self) -> &User {
        &self.user
    }
}

#[async_trait]
impl<S, O> FromRequestParts<S> for Authorized<O>
where
    O: Guarded,
    S: Send + Sync,
    AuthorizationGuard: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok();
        let token = bearer.as_ref().map(|TypedHeader(auth)| auth.token());

        let guard = AuthorizationGuard::from_ref(state);
        let user = guard.authorize_operation(token, O::OPERATION).await?;

        Ok(Self {
            user,
            _operation: PhantomData,
        })
    }
}

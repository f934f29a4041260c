use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use time::UtcDateTime;
use tracing::debug;
use yatube_common::model::{Id, auth::AuthToken, user::UserMarker};
use yatube_db::store::Store;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The principal of a request that carried a valid bearer token.
///
/// Use `Option<AuthenticatedUser>` where anonymous requests are allowed: a
/// missing `Authorization` header yields `None`, a broken one is still rejected.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct AuthenticatedUser {
    id: Id<UserMarker>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.id
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn Store>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(authorization) =
            <AuthorizationHeader as FromRequestParts<S>>::from_request_parts(parts, state)
                .await
                .map_err(ServerError::InvalidAuthorizationHeader)?;
        let request_token: AuthToken = authorization.token().parse()?;

        let token_hash = request_token.hash()?;

        let authentication = Arc::<dyn Store>::from_ref(state)
            .fetch_auth(&token_hash)
            .await?
            .ok_or(ServerError::InvalidToken)?;

        let id = authentication
            .verify(&request_token, UtcDateTime::now())
            .inspect_err(|rejection| {
                debug!(claimed = %request_token.user_id(), %rejection, "Refused matching token");
            })?;

        Ok(Self { id })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn Store>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(None);
        }

        <Self as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}

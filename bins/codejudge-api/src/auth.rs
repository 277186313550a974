// Identity from the upstream provider
//
// The gateway in front of the API authenticates the user and forwards the
// uid and e-mail as headers. A request without a uid is signed out.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use codejudge_common::session::User;
use std::convert::Infallible;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn user_from_parts(parts: &Parts) -> Option<User> {
    let uid = header(parts, USER_ID_HEADER)?;
    let email = header(parts, USER_EMAIL_HEADER).unwrap_or_default();
    Some(User::new(uid, email))
}

/// Signed-in user, rejects with 401 otherwise
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts).map(AuthUser).ok_or(ApiError::Unauthorized)
    }
}

/// Current user if any; the evaluation service decides what a signed-out caller may do
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_from_parts(parts)))
    }
}

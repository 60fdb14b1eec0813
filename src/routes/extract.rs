//! Request extractors shared by the route handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the caller's account identifier, issued by the external
/// account service the frontends authenticate against.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the calling user, taken from the [`USER_ID_HEADER`] header.
/// Authorization beyond identity (the admin flag) is checked against the
/// user row by the services.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing {USER_ID_HEADER} header"))
            })?;

        let id = raw.parse::<Uuid>().map_err(|_| {
            AppError::Unauthorized(format!("malformed {USER_ID_HEADER} header"))
        })?;

        Ok(CurrentUser(id))
    }
}

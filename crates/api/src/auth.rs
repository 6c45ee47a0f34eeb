//! Identity extraction from gateway-injected headers.
//!
//! Authentication itself is handled upstream; the gateway forwards the
//! verified identity as `x-user-id` / `x-user-role` headers. The role
//! is carried through but not re-validated here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use domain::{BuyerIdentity, Role};

use crate::error::ApiError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller, extracted from the identity headers.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub BuyerIdentity);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header"))
            })?;

        let id: i64 = id
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid {USER_ID_HEADER} header: {id}")))?;

        let role = match parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            Some(raw) => raw.parse::<Role>().map_err(|()| {
                ApiError::BadRequest(format!("invalid {USER_ROLE_HEADER} header: {raw}"))
            })?,
            None => Role::Buyer,
        };

        Ok(AuthenticatedUser(BuyerIdentity::new(UserId::new(id), role)))
    }
}

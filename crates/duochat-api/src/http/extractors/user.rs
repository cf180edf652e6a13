//! Caller identity extractor.
//!
//! Identity is supplied by an upstream authentication layer as the
//! `X-User-Id` header and trusted as-is.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use duochat_types::identity::UserId;

use crate::http::error::AppError;

/// Header carrying the authenticated caller's identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The identity making the request.
pub struct CallerId(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for CallerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(USER_ID_HEADER).ok_or_else(|| {
            AppError::Unauthorized("Missing caller identity. Provide it via the 'X-User-Id' header.".to_string())
        })?;

        let raw = header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid X-User-Id header encoding".to_string()))?;

        let user = UserId::new(raw).map_err(|e| AppError::Unauthorized(e.to_string()))?;
        Ok(CallerId(user))
    }
}

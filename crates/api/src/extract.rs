//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::MemberId;

use crate::error::ApiError;

/// Header carrying the authenticated member id.
pub const MEMBER_ID_HEADER: &str = "x-member-id";

/// The authenticated caller, bound by the gateway in front of this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub MemberId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(MEMBER_ID_HEADER)
            .ok_or_else(|| ApiError::InvalidCaller(format!("missing {MEMBER_ID_HEADER} header")))?;

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|id| Caller(MemberId::new(id)))
            .ok_or_else(|| ApiError::InvalidCaller(format!("malformed {MEMBER_ID_HEADER} header")))
    }
}

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;

use crate::error::ApiError;

/// Caller identity as sent in the `User-ID` header. Nothing verifies it.
pub const USER_ID_HEADER: &str = "User-ID";

/// Required `User-ID`; rejects with 400 when absent.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

/// `User-ID` for endpoints that only personalise their answer.
#[derive(Debug, Clone)]
pub struct MaybeUserId(pub Option<String>);

fn header_value(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts)
            .map(UserId)
            .ok_or_else(|| ApiError::BadRequest(format!("missing {} header", USER_ID_HEADER)))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeUserId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUserId(header_value(parts)))
    }
}

/// `?page=&size=` for the paged listings. Pages are zero based.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
    pub size: Option<u32>,
}

use axum::{extract::FromRequestParts, http::request::Parts};
use common_errors::AppError;
use uuid::Uuid;

pub const CALLER_HEADER: &str = "x-user-id";

/// Authenticated user id, set by the gateway in front of the author service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Uuid);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts, _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(CALLER_HEADER).ok_or_else(|| {
            AppError::unauthorized("MISSING_CALLER", "Unauthorized request")
        })?;

        header
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(Caller)
            .ok_or_else(|| {
                AppError::unauthorized("INVALID_CALLER", "Invalid user id")
            })
    }
}

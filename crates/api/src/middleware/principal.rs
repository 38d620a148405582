//! # Principal Extraction
//!
//! Identity lives with the upstream identity provider; the gateway resolves
//! the caller and forwards `X-Principal-Id` and `X-Principal-Role` headers.
//! This module turns those headers into a typed [`Principal`] extractor used
//! by the handlers that require an authenticated party (cancellation,
//! completion, reviews).

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use bookwise_core::errors::BookingError;

use crate::middleware::error_handling::AppError;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalRole {
    Expert,
    Client,
}

/// The resolved calling party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: PrincipalRole,
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id_header = parts
            .headers
            .get(PRINCIPAL_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError(BookingError::Authorization(
                    "Missing principal header".to_string(),
                ))
            })?;

        let id = Uuid::parse_str(id_header).map_err(|_| {
            AppError(BookingError::Authorization(
                "Malformed principal id".to_string(),
            ))
        })?;

        let role = match parts
            .headers
            .get(PRINCIPAL_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some("expert") => PrincipalRole::Expert,
            Some("client") | None => PrincipalRole::Client,
            Some(other) => {
                return Err(AppError(BookingError::Authorization(format!(
                    "Unknown principal role '{}'",
                    other
                ))))
            }
        };

        Ok(Principal { id, role })
    }
}

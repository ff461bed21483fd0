use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const ACTOR_HEADER: &str = "x-actor";

/// Who is calling: the tenant every query is scoped to, plus an optional
/// actor name stamped onto events and cancellations.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub tenant_id: Uuid,
    pub actor: Option<String>,
}

impl CallerContext {
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::BadRequest(format!("missing {} header", TENANT_HEADER)))?;
        let tenant_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::BadRequest(format!("{} is not a UUID", TENANT_HEADER)))?;

        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Ok(Self { tenant_id, actor })
    }
}

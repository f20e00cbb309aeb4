//! Caller identity for owner scoping.
//!
//! Identity verification happens upstream; this layer only trusts the
//! `x-owner-id` header it is handed, and only when scoping is enabled.

use crate::errors::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const OWNER_HEADER: &str = "x-owner-id";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    owner: Option<String>,
}

impl Caller {
    pub fn scoped(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
        }
    }

    /// `None` in single-tenant mode.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn ensure_owns(&self, record_owner: Option<&str>) -> Result<(), AppError> {
        match self.owner() {
            None => Ok(()),
            Some(me) if record_owner == Some(me) => Ok(()),
            Some(_) => Err(AppError::unauthorized("User not authorized")),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !state.config.owner_scoping {
            return Ok(Self::default());
        }

        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(Self::scoped)
            .ok_or_else(|| AppError::unauthorized("missing caller identity"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tenant_caller_owns_everything() {
        let caller = Caller::default();
        assert!(caller.ensure_owns(None).is_ok());
        assert!(caller.ensure_owns(Some("alice")).is_ok());
    }

    #[test]
    fn scoped_caller_owns_only_its_records() {
        let caller = Caller::scoped("alice");
        assert!(caller.ensure_owns(Some("alice")).is_ok());
        assert!(matches!(
            caller.ensure_owns(Some("bob")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(caller.ensure_owns(None), Err(AppError::Unauthorized(_))));
    }
}

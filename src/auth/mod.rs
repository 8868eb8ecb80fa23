//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the caller's account
//! id and, optionally, a display name for the audit trail. Every service call
//! takes an [`AccountContext`] and filters its queries on `account_id`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
pub const ACTOR_HEADER: &str = "x-actor";

const DEFAULT_ACTOR: &str = "system";
const MAX_ACTOR_LEN: usize = 120;

/// Who is calling, and on behalf of which account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    pub account_id: Uuid,
    /// Recorded as the actor of audit-log entries
    pub actor: String,
}

impl AccountContext {
    pub fn new(account_id: Uuid, actor: impl Into<String>) -> Self {
        let actor = actor.into();
        let actor = actor.trim();
        Self {
            account_id,
            actor: if actor.is_empty() {
                DEFAULT_ACTOR.to_string()
            } else {
                actor.chars().take(MAX_ACTOR_LEN).collect()
            },
        }
    }

    /// Context for work not triggered by a person (startup tasks, tests)
    pub fn system(account_id: Uuid) -> Self {
        Self::new(account_id, DEFAULT_ACTOR)
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ServiceError> {
        let raw = headers
            .get(ACCOUNT_ID_HEADER)
            .ok_or_else(|| {
                ServiceError::Unauthorized(format!("Missing {} header", ACCOUNT_ID_HEADER))
            })?
            .to_str()
            .map_err(|_| {
                ServiceError::Unauthorized(format!("Invalid {} header", ACCOUNT_ID_HEADER))
            })?;

        let account_id = Uuid::parse_str(raw.trim()).map_err(|_| {
            ServiceError::Unauthorized(format!("{} must be a UUID", ACCOUNT_ID_HEADER))
        })?;

        let actor = headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_ACTOR);

        Ok(Self::new(account_id, actor))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AccountContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = Self::from_headers(&parts.headers)?;
        tracing::Span::current().record("account_id", tracing::field::display(ctx.account_id));
        Ok(ctx)
    }
}

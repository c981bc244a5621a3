//! Session Resolver
//!
//! Resolves the current user once per page load. The resolved id is passed
//! explicitly to everything downstream; nothing reads it from shared state.

use std::sync::Arc;
use thiserror::Error;

use crate::api::{ApiError, WardrobeApi};
use crate::model::UserId;

/// Why the session could not be resolved
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to resolve current user: {0}")]
    Api(#[from] ApiError),

    #[error("backend returned an empty user id")]
    EmptyUserId,
}

pub struct SessionResolver {
    api: Arc<dyn WardrobeApi>,
}

impl SessionResolver {
    pub fn new(api: Arc<dyn WardrobeApi>) -> Self {
        Self { api }
    }

    /// Single request, no retry
    pub async fn resolve(&self) -> Result<UserId, SessionError> {
        let user = self.api.current_user().await?;
        if user.is_empty() {
            return Err(SessionError::EmptyUserId);
        }

        tracing::debug!(user_id = %user, "Session resolved");
        Ok(user)
    }
}

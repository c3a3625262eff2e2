//! Identity and profile lookups owned by the wider platform.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;

use super::StoreError;

/// Display metadata for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// Resolves user identities. The messaging core never creates users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, user: UserId) -> Result<bool, StoreError>;
}

/// Batch profile resolution for decorating responses.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Profiles for the given ids. Unknown ids are absent from the map.
    async fn profiles(&self, ids: &[UserId]) -> Result<HashMap<UserId, UserProfile>, StoreError>;
}

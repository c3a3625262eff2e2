//! In-memory user directory for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::ports::{ProfileDirectory, StoreError, UserDirectory, UserProfile};

/// Known users and their display metadata.
///
/// An open directory treats every id as an existing user and synthesizes a
/// placeholder profile for ids it has not been told about.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, UserProfile>>>,
    open: bool,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory from a list of profiles.
    pub fn with_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let users = profiles.into_iter().map(|p| (p.id, p)).collect();
        Self {
            users: Arc::new(RwLock::new(users)),
            open: false,
        }
    }

    /// Directory for local runs against `memory://`.
    pub fn open() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    pub async fn insert(&self, profile: UserProfile) {
        self.users.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn exists(&self, user: UserId) -> Result<bool, StoreError> {
        Ok(self.open || self.users.read().await.contains_key(&user))
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryUserDirectory {
    async fn profiles(&self, ids: &[UserId]) -> Result<HashMap<UserId, UserProfile>, StoreError> {
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| match users.get(id) {
                Some(profile) => Some((*id, profile.clone())),
                None if self.open => Some((*id, UserProfile::new(*id, format!("user-{}", id)))),
                None => None,
            })
            .collect())
    }
}

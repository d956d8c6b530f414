//! Remote user directory.
//!
//! Resolves owner emails to remote user IDs. The user list is loaded once
//! (from the `users` snapshot if present, otherwise from the API) and kept
//! until `refresh()` is called explicitly.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::meeting_api::{MeetingApi, MeetingApiError, UserDirectoryEntry};
use crate::snapshot::{SnapshotStore, StoreError, USERS_KEY};

/// Errors from loading or refreshing the user directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to fetch users: {0}")]
    Api(#[from] MeetingApiError),

    #[error("User directory snapshot error: {0}")]
    Store(#[from] StoreError),
}

/// Cached view of the remote user directory.
pub struct UserDirectory {
    api: Arc<dyn MeetingApi>,
    store: Arc<dyn SnapshotStore>,
    users: RwLock<Option<Vec<UserDirectoryEntry>>>,
}

impl UserDirectory {
    pub fn new(api: Arc<dyn MeetingApi>, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            api,
            store,
            users: RwLock::new(None),
        }
    }

    /// All known users, loading them on first use.
    pub async fn users(&self) -> Result<Vec<UserDirectoryEntry>, DirectoryError> {
        if let Some(users) = self.users.read().await.as_ref() {
            return Ok(users.clone());
        }

        let mut cached = self.users.write().await;
        if let Some(users) = cached.as_ref() {
            return Ok(users.clone());
        }

        let users = match self.store.get(USERS_KEY)? {
            Some(snapshot) => {
                debug!("Loading user directory from snapshot");
                serde_json::from_value(snapshot).map_err(|e| StoreError::Malformed {
                    key: USERS_KEY.to_string(),
                    reason: e.to_string(),
                })?
            }
            None => self.fetch_and_store().await?,
        };

        *cached = Some(users.clone());
        Ok(users)
    }

    /// Re-fetch the user list from the API, replacing the cached copy.
    pub async fn refresh(&self) -> Result<Vec<UserDirectoryEntry>, DirectoryError> {
        let mut cached = self.users.write().await;
        let users = self.fetch_and_store().await?;
        *cached = Some(users.clone());
        Ok(users)
    }

    /// Find the user owning `email` (case-insensitive).
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserDirectoryEntry>, DirectoryError> {
        let users = self.users().await?;
        Ok(users
            .into_iter()
            .find(|user| user.email.eq_ignore_ascii_case(email)))
    }

    async fn fetch_and_store(&self) -> Result<Vec<UserDirectoryEntry>, DirectoryError> {
        let users = self.api.list_users().await?;
        info!("Fetched {} users from the meeting API", users.len());

        let snapshot = serde_json::to_value(&users).map_err(|e| StoreError::Malformed {
            key: USERS_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.store.put(USERS_KEY, &snapshot)?;

        Ok(users)
    }
}

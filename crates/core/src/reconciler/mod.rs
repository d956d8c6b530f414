//! Meeting reconciler.
//!
//! Drives a remote meeting to match a local `MeetingConfig`. The first
//! reconciliation of an identifier creates the meeting; every later one
//! pushes the mutable fields to the existing meeting and re-fetches it.
//! The snapshot store is the only record of which meetings exist. The raw
//! server body is saved as soon as it arrives, before it is parsed, so a
//! created meeting is never forgotten.
//!
//! Calls for the same identifier must not run concurrently: two callers
//! could both see no snapshot and both create a meeting.

mod types;

pub use types::*;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::directory::{DirectoryError, UserDirectory};
use crate::meeting_api::{CreateMeetingRequest, MeetingApi, MeetingResource, UpdateMeetingRequest};
use crate::snapshot::{SnapshotStore, StoreError};

/// Reconciles meetings against the remote API, caching snapshots locally.
pub struct Reconciler {
    api: Arc<dyn MeetingApi>,
    store: Arc<dyn SnapshotStore>,
    directory: Arc<UserDirectory>,
}

impl Reconciler {
    pub fn new(
        api: Arc<dyn MeetingApi>,
        store: Arc<dyn SnapshotStore>,
        directory: Arc<UserDirectory>,
    ) -> Self {
        Self {
            api,
            store,
            directory,
        }
    }

    /// Ensure the meeting for `identifier` matches `config`.
    pub async fn reconcile(
        &self,
        identifier: &MeetingIdentifier,
        owner_email: &str,
        config: &MeetingConfig,
    ) -> Result<MeetingResource, ReconcileError> {
        self.reconcile_outcome(identifier, owner_email, config)
            .await
            .map(|outcome| outcome.meeting)
    }

    /// Like `reconcile`, also reporting whether the meeting was created or
    /// updated.
    pub async fn reconcile_outcome(
        &self,
        identifier: &MeetingIdentifier,
        owner_email: &str,
        config: &MeetingConfig,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        config.validate()?;

        let outcome = match self.snapshot(identifier)? {
            None => ReconcileOutcome {
                action: ReconcileAction::Created,
                meeting: self.create(identifier, owner_email, config).await?,
            },
            Some(snapshot) => {
                let meeting_id = remote_id(identifier, &snapshot)?;
                ReconcileOutcome {
                    action: ReconcileAction::Updated,
                    meeting: self.update(identifier, meeting_id, config).await?,
                }
            }
        };

        Ok(outcome)
    }

    /// Cached snapshot for `identifier`, if any.
    pub fn snapshot(&self, identifier: &MeetingIdentifier) -> Result<Option<Value>, ReconcileError> {
        match self.store.get(identifier.as_str()) {
            Ok(snapshot) => Ok(snapshot),
            Err(StoreError::Malformed { reason, .. }) => Err(ReconcileError::CorruptSnapshot {
                identifier: identifier.to_string(),
                reason,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(
        &self,
        identifier: &MeetingIdentifier,
        owner_email: &str,
        config: &MeetingConfig,
    ) -> Result<MeetingResource, ReconcileError> {
        let owner = self
            .directory
            .find_by_email(owner_email)
            .await
            .map_err(|e| match e {
                DirectoryError::Api(e) => ReconcileError::RemoteApi(e),
                DirectoryError::Store(e) => ReconcileError::Store(e),
            })?
            .ok_or_else(|| ReconcileError::UnknownUser(owner_email.to_string()))?;

        let request = CreateMeetingRequest::from(config);
        let body = self.api.create_meeting(&owner.id, &request).await?;
        self.save(identifier, &body)?;
        let meeting = MeetingResource::from_json(&body)?;

        info!(
            "Created meeting {} for {} (host {})",
            meeting.id, identifier, owner_email
        );
        Ok(meeting)
    }

    async fn update(
        &self,
        identifier: &MeetingIdentifier,
        meeting_id: u64,
        config: &MeetingConfig,
    ) -> Result<MeetingResource, ReconcileError> {
        let request = UpdateMeetingRequest::from(config);
        self.api.update_meeting(meeting_id, &request).await?;

        let body = self.api.get_meeting(meeting_id).await?;
        self.save(identifier, &body)?;
        let meeting = MeetingResource::from_json(&body)?;

        info!("Updated meeting {} for {}", meeting_id, identifier);
        Ok(meeting)
    }

    fn save(&self, identifier: &MeetingIdentifier, body: &Value) -> Result<(), ReconcileError> {
        self.store.put(identifier.as_str(), body)?;
        debug!("Saved snapshot for {}", identifier);
        Ok(())
    }
}

/// Remote meeting ID recorded in a snapshot.
///
/// Accepts the numeric form the API returns and a numeric string.
fn remote_id(identifier: &MeetingIdentifier, snapshot: &Value) -> Result<u64, ReconcileError> {
    let corrupt = |reason: &str| ReconcileError::CorruptSnapshot {
        identifier: identifier.to_string(),
        reason: reason.to_string(),
    };

    match snapshot.get("id") {
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| corrupt("id is not a meeting ID")),
        Some(Value::String(s)) => s.parse().map_err(|_| corrupt("id is not a meeting ID")),
        Some(_) => Err(corrupt("id is not a meeting ID")),
        None => Err(corrupt("missing id")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> MeetingIdentifier {
        MeetingIdentifier::new("EVT_1").unwrap()
    }

    #[test]
    fn test_remote_id_from_number() {
        assert_eq!(remote_id(&id(), &json!({"id": 85746065432u64})).unwrap(), 85746065432);
    }

    #[test]
    fn test_remote_id_from_string() {
        assert_eq!(remote_id(&id(), &json!({"id": "123"})).unwrap(), 123);
    }

    #[test]
    fn test_remote_id_missing_or_invalid() {
        for snapshot in [
            json!({}),
            json!({"id": null}),
            json!({"id": -4}),
            json!({"id": "abc"}),
            json!([1, 2]),
        ] {
            let err = remote_id(&id(), &snapshot).unwrap_err();
            assert!(
                matches!(err, ReconcileError::CorruptSnapshot { .. }),
                "{} should be corrupt",
                snapshot
            );
        }
    }
}

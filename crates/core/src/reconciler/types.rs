use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::meeting_api::{
    CreateMeetingRequest, CreateMeetingSettings, MeetingApiError, MeetingResource,
    UpdateMeetingRequest, UpdateMeetingSettings, SCHEDULED_MEETING_TYPE,
};
use crate::snapshot::{validate_key, StoreError, USERS_KEY};

/// Longest password the meeting service accepts.
pub const MAX_PASSWORD_LEN: usize = 10;

/// Logical identifier of a meeting, e.g. `BAICS_12`.
///
/// Doubles as the snapshot key, so it must be a valid store key and must
/// not collide with the user directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MeetingIdentifier(String);

impl MeetingIdentifier {
    pub fn new(id: impl Into<String>) -> Result<Self, ReconcileError> {
        let id = id.into();
        if id == USERS_KEY {
            return Err(ReconcileError::Validation(format!(
                "identifier {:?} is reserved for the user directory",
                id
            )));
        }
        validate_key(&id).map_err(|e| ReconcileError::Validation(e.to_string()))?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MeetingIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MeetingIdentifier {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MeetingIdentifier> for String {
    fn from(id: MeetingIdentifier) -> Self {
        id.0
    }
}

/// Desired state of a meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingConfig {
    pub topic: String,
    pub start_time: DateTime<Utc>,
    /// Duration in minutes.
    pub duration: u32,
    pub password: String,
    pub waiting_room: bool,
}

impl MeetingConfig {
    /// Local checks performed before any network access.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.password.chars().count() > MAX_PASSWORD_LEN {
            return Err(ReconcileError::Validation(format!(
                "password must be at most {} characters",
                MAX_PASSWORD_LEN
            )));
        }
        if self.duration == 0 {
            return Err(ReconcileError::Validation(
                "duration must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&MeetingConfig> for CreateMeetingRequest {
    fn from(config: &MeetingConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            meeting_type: SCHEDULED_MEETING_TYPE,
            start_time: config.start_time,
            duration: config.duration,
            password: config.password.clone(),
            settings: CreateMeetingSettings::secure_defaults(config.waiting_room),
        }
    }
}

impl From<&MeetingConfig> for UpdateMeetingRequest {
    fn from(config: &MeetingConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            start_time: config.start_time,
            password: config.password.clone(),
            duration: config.duration,
            settings: UpdateMeetingSettings {
                join_before_host: !config.waiting_room,
                waiting_room: config.waiting_room,
            },
        }
    }
}

/// Which path a reconciliation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    Created,
    Updated,
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileAction::Created => write!(f, "created"),
            ReconcileAction::Updated => write!(f, "updated"),
        }
    }
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub action: ReconcileAction,
    pub meeting: MeetingResource,
}

/// Errors from reconciling a meeting.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Bad input, detected before any side effect.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No remote user owns the requested email.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// The remote API rejected or failed a request.
    #[error("Remote API error: {0}")]
    RemoteApi(#[from] MeetingApiError),

    /// The cached snapshot cannot be used; delete it to force re-creation.
    #[error("Corrupt snapshot for {identifier}: {reason}")]
    CorruptSnapshot { identifier: String, reason: String },

    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),
}

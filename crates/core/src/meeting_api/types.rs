//! Wire types for the remote meeting API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::MeetingApiError;

/// Meeting type code for a scheduled (non-recurring) meeting.
pub const SCHEDULED_MEETING_TYPE: u8 = 2;

/// Approval type code meaning "no registration required".
pub const NO_REGISTRATION_APPROVAL: u8 = 2;

// ============================================================================
// Remote resources
// ============================================================================

/// A meeting as represented by the remote API.
///
/// Fields not modelled here are kept in `extra` so a cached snapshot
/// preserves the full server response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeetingResource {
    /// Remote meeting ID.
    pub id: u64,
    /// Remote ID of the hosting user.
    #[serde(default)]
    pub host_id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub join_url: String,
    #[serde(default)]
    pub start_url: String,
    #[serde(default)]
    pub settings: MeetingSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MeetingResource {
    /// Typed view of a raw meeting body as returned by the API.
    pub fn from_json(body: &Value) -> Result<Self, MeetingApiError> {
        Self::deserialize(body)
            .map_err(|e| MeetingApiError::ParseError(format!("Invalid meeting body: {}", e)))
    }
}

/// Meeting settings echoed by the remote API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeetingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_video: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_video: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_before_host: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute_upon_entry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_room: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_authentication: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user account in the remote directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDirectoryEntry {
    /// Remote user ID.
    pub id: String,
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /users/{userId}/meetings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateMeetingRequest {
    pub topic: String,
    #[serde(rename = "type")]
    pub meeting_type: u8,
    #[serde(serialize_with = "serialize_start_time")]
    pub start_time: DateTime<Utc>,
    pub duration: u32,
    pub password: String,
    pub settings: CreateMeetingSettings,
}

/// Settings sent on creation, including the fixed security defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateMeetingSettings {
    pub host_video: bool,
    pub participant_video: bool,
    pub join_before_host: bool,
    pub mute_upon_entry: bool,
    pub watermark: bool,
    pub use_pmi: bool,
    pub approval_type: u8,
    pub audio: String,
    pub auto_recording: String,
    pub waiting_room: bool,
    pub meeting_authentication: bool,
}

impl CreateMeetingSettings {
    /// Security defaults applied to every new meeting.
    pub fn secure_defaults(waiting_room: bool) -> Self {
        Self {
            host_video: true,
            participant_video: false,
            join_before_host: !waiting_room,
            mute_upon_entry: true,
            watermark: false,
            use_pmi: false,
            approval_type: NO_REGISTRATION_APPROVAL,
            audio: "both".to_string(),
            auto_recording: "none".to_string(),
            waiting_room,
            meeting_authentication: true,
        }
    }
}

/// Body of `PATCH /meetings/{meetingId}`: the mutable subset only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateMeetingRequest {
    pub topic: String,
    #[serde(serialize_with = "serialize_start_time")]
    pub start_time: DateTime<Utc>,
    pub password: String,
    pub duration: u32,
    pub settings: UpdateMeetingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateMeetingSettings {
    pub join_before_host: bool,
    pub waiting_room: bool,
}

/// The API expects `yyyy-MM-ddTHH:mm:ssZ` for UTC start times.
fn serialize_start_time<S>(start_time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&start_time.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

//! Mock meeting API for testing.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::meeting_api::{
    CreateMeetingRequest, MeetingApi, MeetingApiError, MeetingResource, MeetingSettings,
    UpdateMeetingRequest, UserDirectoryEntry,
};

/// First ID handed out to created meetings.
const FIRST_MEETING_ID: u64 = 85_000_000_001;

/// A recorded API call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedApiCall {
    ListUsers,
    CreateMeeting {
        owner_id: String,
        request: CreateMeetingRequest,
    },
    UpdateMeeting {
        meeting_id: u64,
        request: UpdateMeetingRequest,
    },
    GetMeeting {
        meeting_id: u64,
    },
}

/// Mock implementation of the MeetingApi trait.
///
/// Behaves like a tiny in-memory meeting service:
/// - Created meetings get sequential IDs and are kept for later fetches
/// - Updates are applied to the stored meeting
/// - Unknown meeting IDs answer 404
/// - Every call is recorded, including calls that fail
/// - The next meeting body can be altered to mimic odd server payloads
///
/// # Example
///
/// ```rust,ignore
/// use meetsync_core::testing::{MockMeetingApi, fixtures};
///
/// let api = MockMeetingApi::new();
/// api.set_users(vec![fixtures::user("u1", "a@x.com")]).await;
/// ```
#[derive(Debug)]
pub struct MockMeetingApi {
    users: Arc<RwLock<Vec<UserDirectoryEntry>>>,
    meetings: Arc<RwLock<HashMap<u64, MeetingResource>>>,
    next_id: Arc<RwLock<u64>>,
    calls: Arc<RwLock<Vec<RecordedApiCall>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<MeetingApiError>>>,
    /// If set, merged into the next create/get response body.
    next_response_fields: Arc<RwLock<Option<Map<String, Value>>>>,
}

impl Default for MockMeetingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMeetingApi {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(Vec::new())),
            meetings: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(FIRST_MEETING_ID)),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            next_response_fields: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Directory and meeting state
    // =========================================================================

    /// Replace the user directory.
    pub async fn set_users(&self, users: Vec<UserDirectoryEntry>) {
        *self.users.write().await = users;
    }

    /// Insert a meeting as if it had been created earlier.
    pub async fn add_meeting(&self, meeting: MeetingResource) {
        self.meetings.write().await.insert(meeting.id, meeting);
    }

    /// Delete a meeting behind the client's back.
    pub async fn remove_meeting(&self, meeting_id: u64) -> bool {
        self.meetings.write().await.remove(&meeting_id).is_some()
    }

    /// Current server-side state of a meeting.
    pub async fn meeting(&self, meeting_id: u64) -> Option<MeetingResource> {
        self.meetings.read().await.get(&meeting_id).cloned()
    }

    pub async fn meeting_count(&self) -> usize {
        self.meetings.read().await.len()
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn calls(&self) -> Vec<RecordedApiCall> {
        self.calls.read().await.clone()
    }

    /// Clear recorded calls.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    pub async fn count_calls(&self, pred: impl Fn(&RecordedApiCall) -> bool) -> usize {
        self.calls.read().await.iter().filter(|c| pred(c)).count()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: MeetingApiError) {
        *self.next_error.write().await = Some(error);
    }

    /// Merge `fields` into the next create/get response body. The stored
    /// meeting is not affected.
    pub async fn override_next_response(&self, fields: Map<String, Value>) {
        *self.next_response_fields.write().await = Some(fields);
    }

    async fn respond(&self, meeting: &MeetingResource) -> Result<Value, MeetingApiError> {
        let mut body =
            serde_json::to_value(meeting).map_err(|e| MeetingApiError::ParseError(e.to_string()))?;

        if let Some(fields) = self.next_response_fields.write().await.take() {
            if let Value::Object(object) = &mut body {
                object.extend(fields);
            }
        }

        Ok(body)
    }

    /// Record a call, then fail it if an error is pending.
    async fn record(&self, call: RecordedApiCall) -> Result<(), MeetingApiError> {
        self.calls.write().await.push(call);
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(meeting_id: u64) -> MeetingApiError {
        MeetingApiError::ApiError {
            status: 404,
            body: format!(
                r#"{{"code":3001,"message":"Meeting {} is not found or has expired."}}"#,
                meeting_id
            ),
        }
    }
}

#[async_trait]
impl MeetingApi for MockMeetingApi {
    async fn list_users(&self) -> Result<Vec<UserDirectoryEntry>, MeetingApiError> {
        self.record(RecordedApiCall::ListUsers).await?;
        Ok(self.users.read().await.clone())
    }

    async fn create_meeting(
        &self,
        owner_id: &str,
        request: &CreateMeetingRequest,
    ) -> Result<Value, MeetingApiError> {
        self.record(RecordedApiCall::CreateMeeting {
            owner_id: owner_id.to_string(),
            request: request.clone(),
        })
        .await?;

        let id = {
            let mut next_id = self.next_id.write().await;
            let id = *next_id;
            *next_id += 1;
            id
        };

        let settings = &request.settings;
        let meeting = MeetingResource {
            id,
            host_id: owner_id.to_string(),
            topic: request.topic.clone(),
            start_time: Some(request.start_time),
            duration: request.duration,
            password: Some(request.password.clone()),
            join_url: format!("https://zoom.example/j/{}", id),
            start_url: format!("https://zoom.example/s/{}", id),
            settings: MeetingSettings {
                host_video: Some(settings.host_video),
                participant_video: Some(settings.participant_video),
                join_before_host: Some(settings.join_before_host),
                mute_upon_entry: Some(settings.mute_upon_entry),
                watermark: Some(settings.watermark),
                waiting_room: Some(settings.waiting_room),
                meeting_authentication: Some(settings.meeting_authentication),
                extra: Default::default(),
            },
            extra: Default::default(),
        };

        self.meetings.write().await.insert(id, meeting.clone());
        self.respond(&meeting).await
    }

    async fn update_meeting(
        &self,
        meeting_id: u64,
        request: &UpdateMeetingRequest,
    ) -> Result<(), MeetingApiError> {
        self.record(RecordedApiCall::UpdateMeeting {
            meeting_id,
            request: request.clone(),
        })
        .await?;

        let mut meetings = self.meetings.write().await;
        let meeting = meetings
            .get_mut(&meeting_id)
            .ok_or_else(|| Self::not_found(meeting_id))?;

        meeting.topic = request.topic.clone();
        meeting.start_time = Some(request.start_time);
        meeting.password = Some(request.password.clone());
        meeting.duration = request.duration;
        meeting.settings.join_before_host = Some(request.settings.join_before_host);
        meeting.settings.waiting_room = Some(request.settings.waiting_room);

        Ok(())
    }

    async fn get_meeting(&self, meeting_id: u64) -> Result<Value, MeetingApiError> {
        self.record(RecordedApiCall::GetMeeting { meeting_id }).await?;

        let meeting = self
            .meetings
            .read()
            .await
            .get(&meeting_id)
            .cloned()
            .ok_or_else(|| Self::not_found(meeting_id))?;
        self.respond(&meeting).await
    }
}

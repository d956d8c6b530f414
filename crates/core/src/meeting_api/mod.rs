//! Remote meeting API abstraction.
//!
//! The reconciler talks to the meeting service only through the
//! `MeetingApi` trait; `ZoomClient` is the HTTP implementation.

mod types;
mod zoom;

pub use types::*;
pub use zoom::ZoomClient;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the remote meeting API.
#[derive(Debug, Error)]
pub enum MeetingApiError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API answered with a non-2xx status.
    #[error("API error: {status} - {body}")]
    ApiError { status: u16, body: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl MeetingApiError {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            MeetingApiError::ApiError { status, .. } => Some(*status),
            MeetingApiError::HttpError(e) => e.status().map(|s| s.as_u16()),
            MeetingApiError::ParseError(_) => None,
        }
    }

    /// Whether the remote resource does not exist (404).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Operations the reconciler needs from the meeting service.
///
/// Meeting bodies are returned raw so callers can persist exactly what the
/// server sent; `MeetingResource::from_json` gives the typed view.
#[async_trait]
pub trait MeetingApi: Send + Sync {
    /// List all active users.
    async fn list_users(&self) -> Result<Vec<UserDirectoryEntry>, MeetingApiError>;

    /// Create a meeting owned by `owner_id`.
    async fn create_meeting(
        &self,
        owner_id: &str,
        request: &CreateMeetingRequest,
    ) -> Result<Value, MeetingApiError>;

    /// Apply a partial update to an existing meeting.
    async fn update_meeting(
        &self,
        meeting_id: u64,
        request: &UpdateMeetingRequest,
    ) -> Result<(), MeetingApiError>;

    /// Fetch a meeting by remote ID.
    async fn get_meeting(&self, meeting_id: u64) -> Result<Value, MeetingApiError>;
}

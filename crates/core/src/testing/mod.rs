//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meetsync_core::testing::{fixtures, MockMeetingApi};
//! use meetsync_core::MemorySnapshotStore;
//!
//! let api = Arc::new(MockMeetingApi::new());
//! api.set_users(vec![fixtures::user("u1", "a@x.com")]).await;
//! let store = Arc::new(MemorySnapshotStore::new());
//! ```

mod mock_meeting_api;

pub use mock_meeting_api::{MockMeetingApi, RecordedApiCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{TimeZone, Utc};
    use serde_json::Map;

    use crate::meeting_api::{CreateMeetingRequest, UserDirectoryEntry};
    use crate::reconciler::MeetingConfig;

    /// Create a directory entry.
    pub fn user(id: &str, email: &str) -> UserDirectoryEntry {
        UserDirectoryEntry {
            id: id.to_string(),
            email: email.to_string(),
            extra: Map::new(),
        }
    }

    /// A 60 minute meeting on 2020-04-26 14:00 UTC with a waiting room.
    pub fn meeting_config(topic: &str) -> MeetingConfig {
        MeetingConfig {
            topic: topic.to_string(),
            start_time: Utc.with_ymd_and_hms(2020, 4, 26, 14, 0, 0).unwrap(),
            duration: 60,
            password: "abc123".to_string(),
            waiting_room: true,
        }
    }

    /// Creation request for `meeting_config(topic)`.
    pub fn create_request(topic: &str) -> CreateMeetingRequest {
        CreateMeetingRequest::from(&meeting_config(topic))
    }
}

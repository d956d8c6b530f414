//! Zoom REST API client.
//!
//! Every request carries the configured bearer token. Zoom caps meeting
//! creation at 100 per user per day; callers pace batches themselves.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;

use super::{
    CreateMeetingRequest, MeetingApi, MeetingApiError, UpdateMeetingRequest, UserDirectoryEntry,
};

/// Zoom API client.
pub struct ZoomClient {
    client: Client,
    base_url: String,
    token: String,
    users_page_size: u32,
}

impl ZoomClient {
    /// Create a new Zoom client.
    pub fn new(config: &ApiConfig) -> Result<Self, MeetingApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            users_page_size: config.users_page_size,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Log the exchange and turn non-2xx responses into `ApiError`.
    async fn check(
        method: &str,
        endpoint: &str,
        response: Response,
    ) -> Result<Response, MeetingApiError> {
        let status = response.status();
        info!("{} {} {}", method, endpoint, status.as_u16());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} {} failed: {}", method, endpoint, body);
            return Err(MeetingApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> Result<T, MeetingApiError> {
        response.json().await.map_err(|e| {
            MeetingApiError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl MeetingApi for ZoomClient {
    async fn list_users(&self) -> Result<Vec<UserDirectoryEntry>, MeetingApiError> {
        let endpoint = "/users";
        let url = self.url(endpoint);
        let page_size = self.users_page_size.to_string();

        let mut users = Vec::new();
        let mut page_number: u32 = 1;

        loop {
            debug!("Zoom list users: page_number={}", page_number);

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[
                    ("status", "active"),
                    ("page_size", page_size.as_str()),
                    ("page_number", page_number.to_string().as_str()),
                ])
                .send()
                .await?;

            let response = Self::check("GET", endpoint, response).await?;
            let page: ZoomUsersPage = Self::parse(response, "users").await?;
            users.extend(page.users);

            if page_number >= page.page_count {
                break;
            }
            page_number += 1;
        }

        Ok(users)
    }

    async fn create_meeting(
        &self,
        owner_id: &str,
        request: &CreateMeetingRequest,
    ) -> Result<Value, MeetingApiError> {
        let endpoint = format!("/users/{}/meetings", urlencoding::encode(owner_id));

        debug!("Zoom create meeting: owner={}, topic='{}'", owner_id, request.topic);

        let response = self
            .client
            .post(self.url(&endpoint))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        let response = Self::check("POST", &endpoint, response).await?;
        Self::parse(response, "create meeting").await
    }

    async fn update_meeting(
        &self,
        meeting_id: u64,
        request: &UpdateMeetingRequest,
    ) -> Result<(), MeetingApiError> {
        let endpoint = format!("/meetings/{}", meeting_id);

        debug!("Zoom update meeting: id={}, topic='{}'", meeting_id, request.topic);

        let response = self
            .client
            .patch(self.url(&endpoint))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        Self::check("PATCH", &endpoint, response).await?;
        Ok(())
    }

    async fn get_meeting(&self, meeting_id: u64) -> Result<Value, MeetingApiError> {
        let endpoint = format!("/meetings/{}", meeting_id);

        let response = self
            .client
            .get(self.url(&endpoint))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = Self::check("GET", &endpoint, response).await?;
        Self::parse(response, "meeting").await
    }
}

// ============================================================================
// Zoom API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ZoomUsersPage {
    #[serde(default)]
    page_count: u32,
    #[serde(default)]
    users: Vec<UserDirectoryEntry>,
}

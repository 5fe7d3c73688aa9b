use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::{MatchStatus, ProfileId};

/// Default status endpoint; `{profile_id}` is replaced per request
pub const DEFAULT_STATUS_URL: &str =
    "https://aoe4world.com/api/v0/players/{profile_id}/games/last";

/// Default bound on a single status request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure of a single status request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The endpoint does not recognize the profile identifier
    #[error("profile not found")]
    NotFound,

    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl StatusError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StatusError::NotFound)
    }
}

/// Source of match status for a profile
pub trait StatusSource: Send + Sync + 'static {
    fn fetch_status(&self, profile_id: &ProfileId)
        -> BoxFuture<'static, Result<MatchStatus, StatusError>>;
}

/// Client for the match status endpoint
#[derive(Clone)]
pub struct StatusClient {
    client: Client,
    url_template: String,
}

impl StatusClient {
    /// Create a new client with a bounded request timeout
    pub fn new(url_template: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url_template: url_template.to_string(),
        })
    }

    /// Build the request URL for a profile
    pub fn status_url(&self, profile_id: &ProfileId) -> String {
        self.url_template
            .replace("{profile_id}", &urlencoding::encode(profile_id.as_str()))
    }

    /// Fetch the status of the profile's latest game
    pub async fn fetch(&self, profile_id: &ProfileId) -> Result<MatchStatus, StatusError> {
        let body = self.fetch_raw(profile_id).await?;
        let status = parse_status(body)?;

        debug!("Match status for {}: ongoing={}", profile_id, status.ongoing);
        Ok(status)
    }

    /// Fetch the full JSON document for the profile's latest game
    pub async fn fetch_raw(&self, profile_id: &ProfileId) -> Result<Value, StatusError> {
        let url = self.status_url(profile_id);

        debug!("Fetching match status: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(classify_transport)?;

        check_status_code(response.status())?;

        response.json().await.map_err(classify_transport)
    }
}

impl StatusSource for StatusClient {
    fn fetch_status(
        &self,
        profile_id: &ProfileId,
    ) -> BoxFuture<'static, Result<MatchStatus, StatusError>> {
        let client = self.clone();
        let profile_id = profile_id.clone();
        Box::pin(async move { client.fetch(&profile_id).await })
    }
}

/// Map an HTTP status to the error taxonomy; `Ok` only for success codes
pub fn check_status_code(status: StatusCode) -> Result<(), StatusError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::NOT_FOUND {
        Err(StatusError::NotFound)
    } else {
        Err(StatusError::UnexpectedStatus(status.as_u16()))
    }
}

/// Read the match status out of a response document
pub fn parse_status(body: Value) -> Result<MatchStatus, StatusError> {
    if !body.is_object() {
        return Err(StatusError::Decode("expected a JSON object".to_string()));
    }

    serde_json::from_value(body).map_err(|e| StatusError::Decode(e.to_string()))
}

fn classify_transport(err: reqwest::Error) -> StatusError {
    if err.is_timeout() {
        StatusError::Timeout
    } else if err.is_decode() {
        StatusError::Decode(err.to_string())
    } else {
        StatusError::Connection(err.to_string())
    }
}

//! `StravaClient` trait, data model and error type for the Strava v3 API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod config;
pub mod context;
pub mod http_client;
pub mod rate_limit;

pub use context::CallContext;

#[derive(Debug, Error)]
pub enum StravaError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },
    #[error("request failed with status: {status}: {body}")]
    Upstream { status: String, body: String },
    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

impl StravaError {
    pub fn transport(message: impl Into<String>) -> Self {
        StravaError::Transport {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, StravaError::Transport { .. })
    }
}

impl From<reqwest::Error> for StravaError {
    fn from(err: reqwest::Error) -> Self {
        StravaError::Transport {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// The authenticated athlete.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Athlete {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub username: String,
    #[serde(default, rename = "firstname", deserialize_with = "deserialize_nullable_string")]
    pub first_name: String,
    #[serde(default, rename = "lastname", deserialize_with = "deserialize_nullable_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub city: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ActivitySummary {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub start_date: String, // ISO-8601, as sent by the API
}

/// One page of `GET /athlete/activities`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivityPage {
    pub activities: Vec<ActivitySummary>,
    /// True when the page came back full, so another page may exist.
    pub has_more: bool,
}

// Strava sends `null` for profile fields the athlete never filled in.
fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[async_trait]
pub trait StravaClient: Send + Sync {
    /// Fetch the athlete who owns the access token.
    async fn get_athlete(&self, ctx: &CallContext) -> Result<Athlete, StravaError>;

    /// List activities started within `(from, to)`, one page at a time.
    ///
    /// Pages are 1-based. `has_more` on the returned page is a page-size
    /// heuristic; a following empty page is a normal end of the listing.
    async fn list_activities(
        &self,
        ctx: &CallContext,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        page: u32,
    ) -> Result<ActivityPage, StravaError>;

    /// Rename an activity.
    async fn update_activity(
        &self,
        ctx: &CallContext,
        id: i64,
        name: &str,
    ) -> Result<(), StravaError>;
}

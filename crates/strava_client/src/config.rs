use std::time::Duration;

use crate::StravaError;
use crate::rate_limit::DEFAULT_INTERVAL;
use secrecy::SecretString;

pub const DEFAULT_BASE_URL: &str = "https://www.strava.com/api/v3";

#[derive(Clone, Debug)]
pub struct Config {
    pub access_token: SecretString,
    pub base_url: String,
    pub rate_limit_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, StravaError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Read configuration through `get` instead of the process environment,
    /// so tests never have to mutate global state.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, StravaError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let token = get("STRAVA_ACCESS_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StravaError::Config("STRAVA_ACCESS_TOKEN missing".into()))?;
        let base_url = get("STRAVA_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let rate_limit_interval = match get("STRAVA_RATE_LIMIT_INTERVAL_SECS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                StravaError::Config(format!("STRAVA_RATE_LIMIT_INTERVAL_SECS={raw:?}: {e}"))
            })?,
            None => DEFAULT_INTERVAL,
        };
        Ok(Self {
            access_token: SecretString::new(token.into()),
            base_url,
            rate_limit_interval,
        })
    }
}

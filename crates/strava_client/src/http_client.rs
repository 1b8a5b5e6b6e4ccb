//! HTTP client implementation for the Strava v3 API.
//!
//! This module provides a reqwest-based implementation of the [`StravaClient`](crate::StravaClient) trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::{Config, DEFAULT_BASE_URL};
use crate::rate_limit::{self, IntervalRateLimiter, RateLimiter};
use crate::{ActivityPage, ActivitySummary, Athlete, CallContext, StravaClient, StravaError};

/// Page size requested from `GET /athlete/activities`. A page of exactly this
/// many items is taken to mean another page may follow.
pub const PER_PAGE: usize = 100;

/// Client for the Strava API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestStravaClient {
    base_url: String,
    access_token: SecretString,
    client: reqwest::Client,
    limiter: Arc<dyn RateLimiter>,
    debug: bool,
}

impl ReqwestStravaClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `access_token` - Pre-obtained OAuth token with `activity:read_all` and `activity:write`
    /// * `client` - Underlying HTTP client; a default one is built when `None`
    /// * `debug` - Log every response (method, URL, headers, body) at debug level
    ///
    /// Requests are throttled by the process-wide limiter from
    /// [`rate_limit::shared`] unless [`with_rate_limiter`](Self::with_rate_limiter) replaces it.
    pub fn new(
        access_token: SecretString,
        client: Option<reqwest::Client>,
        debug: bool,
    ) -> Result<Self, StravaError> {
        if access_token.expose_secret().is_empty() {
            return Err(StravaError::InvalidArgument(
                "access token is required".into(),
            ));
        }
        let client = match client {
            Some(c) => c,
            None => reqwest::Client::builder().build()?,
        };
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token,
            client,
            limiter: rate_limit::shared(),
            debug,
        })
    }

    /// Build a client from environment configuration with its own limiter.
    pub fn from_config(cfg: &Config, debug: bool) -> Result<Self, StravaError> {
        Ok(Self::new(cfg.access_token.clone(), None, debug)?
            .with_base_url(&cfg.base_url)
            .with_rate_limiter(Arc::new(IntervalRateLimiter::new(
                cfg.rate_limit_interval,
            ))))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.request(Method::GET, url)
    }

    fn put_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.request(Method::PUT, url)
    }

    /// Send a request through the rate limiter with bearer auth and return the
    /// buffered body of a `200 OK` response.
    ///
    /// The whole exchange runs under `ctx`. Any other status is an
    /// [`StravaError::Upstream`]; its body is not handed back.
    async fn execute(
        &self,
        ctx: &CallContext,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<u8>, StravaError> {
        ctx.run(async {
            self.limiter.acquire().await?;

            let request = request
                .bearer_auth(self.access_token.expose_secret())
                .build()?;
            let method = request.method().clone();
            let url = request.url().clone();

            let resp = self.client.execute(request).await.inspect_err(|_| {
                record_request(&method, "transport");
            })?;
            let status = resp.status();
            let headers = resp.headers().clone();
            let body = resp.bytes().await?;

            if self.debug {
                tracing::debug!(
                    %method,
                    %url,
                    %status,
                    ?headers,
                    body = %String::from_utf8_lossy(&body),
                    "strava response"
                );
            }

            if status != StatusCode::OK {
                record_request(&method, "upstream");
                let body_snippet: String =
                    String::from_utf8_lossy(&body).chars().take(256).collect();
                return Err(StravaError::Upstream {
                    status: status.to_string(),
                    body: body_snippet,
                });
            }

            record_request(&method, "ok");
            Ok::<_, StravaError>(body.to_vec())
        })
        .await
    }

    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StravaError> {
        let body = self.execute(ctx, request).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn record_request(method: &Method, outcome: &'static str) {
    metrics::counter!(
        "strava_client_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

#[derive(Serialize)]
struct UpdatableActivity<'a> {
    name: &'a str,
}

#[async_trait]
impl StravaClient for ReqwestStravaClient {
    // https://developers.strava.com/docs/reference/#api-Athletes-getLoggedInAthlete
    async fn get_athlete(&self, ctx: &CallContext) -> Result<Athlete, StravaError> {
        let url = self.url("athlete");
        self.execute_json(ctx, self.get_request(&url)).await
    }

    // https://developers.strava.com/docs/reference/#api-Activities-getLoggedInAthleteActivities
    async fn list_activities(
        &self,
        ctx: &CallContext,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        page: u32,
    ) -> Result<ActivityPage, StravaError> {
        if to <= from {
            return Err(StravaError::InvalidArgument(format!(
                "to date must be after from date (from={from}, to={to})"
            )));
        }

        let url = self.url("athlete/activities");
        let qp = [
            ("before", to.timestamp().to_string()),
            ("after", from.timestamp().to_string()),
            ("page", page.to_string()),
            ("per_page", PER_PAGE.to_string()),
        ];
        let activities: Vec<ActivitySummary> =
            self.execute_json(ctx, self.get_request(&url).query(&qp)).await?;
        let has_more = activities.len() == PER_PAGE;
        Ok(ActivityPage {
            activities,
            has_more,
        })
    }

    // https://developers.strava.com/docs/reference/#api-Activities-updateActivityById
    async fn update_activity(
        &self,
        ctx: &CallContext,
        id: i64,
        name: &str,
    ) -> Result<(), StravaError> {
        let url = self.url(&format!("activities/{id}"));
        let request = self
            .put_request(&url)
            .json(&UpdatableActivity { name });
        self.execute(ctx, request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::Unlimited;
    use chrono::TimeZone;

    fn client() -> ReqwestStravaClient {
        ReqwestStravaClient::new(SecretString::new("tok".into()), None, false)
            .expect("client")
            .with_rate_limiter(Arc::new(Unlimited))
    }

    #[test]
    fn new_rejects_empty_token() {
        let res = ReqwestStravaClient::new(SecretString::new("".into()), None, false);
        assert!(matches!(res, Err(StravaError::InvalidArgument(_))));
    }

    #[test]
    fn new_accepts_any_non_empty_token() {
        for token in ["x", " ", "access_token"] {
            assert!(ReqwestStravaClient::new(SecretString::new(token.into()), None, false).is_ok());
        }
    }

    #[test]
    fn default_base_url_is_strava() {
        assert_eq!(client().base_url(), "https://www.strava.com/api/v3");
    }

    #[test]
    fn with_base_url_trims_trailing_slash() {
        let c = client().with_base_url("http://localhost:1234/");
        assert_eq!(c.url("athlete"), "http://localhost:1234/athlete");
        assert_eq!(c.url("/activities/1"), "http://localhost:1234/activities/1");
    }

    #[test]
    fn debug_output_hides_token() {
        let c = client();
        assert!(!format!("{c:?}").contains("tok\""));
    }

    #[tokio::test]
    async fn list_activities_rejects_inverted_range_without_request() {
        // nothing listens on this address; reaching the network would be a transport error
        let c = client().with_base_url("http://127.0.0.1:9");
        let at = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let ctx = CallContext::background();

        let same = c.list_activities(&ctx, at, at, 1).await;
        assert!(matches!(same, Err(StravaError::InvalidArgument(_))));

        let inverted = c
            .list_activities(&ctx, at, at - chrono::Duration::days(1), 1)
            .await;
        assert!(matches!(inverted, Err(StravaError::InvalidArgument(_))));
    }
}

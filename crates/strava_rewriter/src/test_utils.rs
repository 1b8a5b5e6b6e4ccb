//! Mock `StravaClient` shared by the unit tests.
#![cfg(test)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use strava_client::{ActivityPage, ActivitySummary, Athlete, CallContext, StravaClient, StravaError};

pub fn activity(id: i64, name: &str) -> ActivitySummary {
    ActivitySummary {
        id,
        name: name.to_string(),
        start_date: "2021-06-01T06:00:00Z".to_string(),
    }
}

/// A full page of 100 untranslatable activities with ids starting at `first_id`.
pub fn full_page(first_id: i64) -> Vec<ActivitySummary> {
    (first_id..first_id + 100)
        .map(|id| activity(id, "Recovery"))
        .collect()
}

/// Serves scripted pages in order and records every update.
#[derive(Default)]
pub struct MockClient {
    pages: Mutex<VecDeque<Result<Vec<ActivitySummary>, StravaError>>>,
    pages_requested: Mutex<Vec<u32>>,
    updates: Mutex<Vec<(i64, String)>>,
    fail_update_id: Option<i64>,
    fail_athlete: bool,
}

impl MockClient {
    pub fn with_pages(pages: Vec<Result<Vec<ActivitySummary>, StravaError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Default::default()
        }
    }

    pub fn failing_update(mut self, id: i64) -> Self {
        self.fail_update_id = Some(id);
        self
    }

    pub fn failing_athlete(mut self) -> Self {
        self.fail_athlete = true;
        self
    }

    pub fn pages_requested(&self) -> Vec<u32> {
        self.pages_requested.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(i64, String)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl StravaClient for MockClient {
    async fn get_athlete(&self, _ctx: &CallContext) -> Result<Athlete, StravaError> {
        if self.fail_athlete {
            return Err(StravaError::Upstream {
                status: "401 Unauthorized".into(),
                body: String::new(),
            });
        }
        Ok(Athlete {
            id: 42,
            username: "test_athlete".into(),
            ..Default::default()
        })
    }

    async fn list_activities(
        &self,
        _ctx: &CallContext,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
        page: u32,
    ) -> Result<ActivityPage, StravaError> {
        self.pages_requested.lock().unwrap().push(page);
        let next = self.pages.lock().unwrap().pop_front().unwrap_or(Ok(vec![]));
        next.map(|activities| ActivityPage {
            has_more: activities.len() == 100,
            activities,
        })
    }

    async fn update_activity(
        &self,
        _ctx: &CallContext,
        id: i64,
        name: &str,
    ) -> Result<(), StravaError> {
        if self.fail_update_id == Some(id) {
            return Err(StravaError::Upstream {
                status: "404 Not Found".into(),
                body: String::new(),
            });
        }
        self.updates.lock().unwrap().push((id, name.to_string()));
        Ok(())
    }
}

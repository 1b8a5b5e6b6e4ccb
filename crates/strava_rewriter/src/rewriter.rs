//! The rewrite run: fetch the athlete, page through activities in a date
//! range, and rename the ones whose name translates.

use std::time::Duration;

use chrono::{DateTime, Utc};
use strava_client::{ActivitySummary, Athlete, CallContext, StravaClient};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{RewriteError, RewriteResult};
use crate::translate::Translator;

/// What to do when fetching a page of activities fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PageErrorPolicy {
    /// Log the failure and continue with the activities fetched so far.
    #[default]
    Stop,
    /// Fail the whole run.
    Abort,
}

#[derive(Clone, Debug)]
pub struct RewriteOptions {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub on_page_error: PageErrorPolicy,
    /// Log the renames without sending them.
    pub dry_run: bool,
    /// Deadline applied to each API call.
    pub call_timeout: Option<Duration>,
    pub cancel: Option<watch::Receiver<bool>>,
}

impl RewriteOptions {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            on_page_error: PageErrorPolicy::default(),
            dry_run: false,
            call_timeout: None,
            cancel: None,
        }
    }

    /// A fresh context for one API call.
    fn call_context(&self) -> CallContext {
        let mut ctx = CallContext::background();
        if let Some(timeout) = self.call_timeout {
            ctx = ctx.with_timeout(timeout);
        }
        if let Some(cancel) = &self.cancel {
            ctx = ctx.with_cancel(cancel.clone());
        }
        ctx
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteSummary {
    pub athlete: Athlete,
    pub fetched: usize,
    pub translated: usize,
}

/// Collect every activity in `opts.from..opts.to`, page by page.
///
/// Stops after a page that is empty or not full. A failed page is handled per
/// `opts.on_page_error`, including an invalid date range.
pub async fn fetch_activities<C>(
    client: &C,
    opts: &RewriteOptions,
) -> RewriteResult<Vec<ActivitySummary>>
where
    C: StravaClient + ?Sized,
{
    let mut activities = Vec::new();
    for page in 1u32.. {
        let result = client
            .list_activities(&opts.call_context(), opts.from, opts.to, page)
            .await;
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(source) => match opts.on_page_error {
                PageErrorPolicy::Stop => {
                    warn!(page, error = %source, "failed to get activities, stopping pagination");
                    break;
                }
                PageErrorPolicy::Abort => return Err(RewriteError::Page { page, source }),
            },
        };
        if fetched.activities.is_empty() {
            break;
        }
        activities.extend(fetched.activities);
        if !fetched.has_more {
            break;
        }
    }
    Ok(activities)
}

/// Rename every activity whose name translates to something different.
///
/// The first failed update aborts the run. Returns how many activities were
/// renamed (or would have been, in dry-run mode).
pub async fn rename_activities<C>(
    client: &C,
    translator: &Translator,
    opts: &RewriteOptions,
    activities: &[ActivitySummary],
) -> RewriteResult<usize>
where
    C: StravaClient + ?Sized,
{
    let mut translated = 0;
    for activity in activities {
        tracing::debug!(?activity, "activity");

        let new_name = translator.activity_name(&activity.name);
        if new_name == activity.name {
            continue;
        }

        info!(id = activity.id, from = %activity.name, to = %new_name, "translating name");
        if !opts.dry_run {
            client
                .update_activity(&opts.call_context(), activity.id, &new_name)
                .await
                .map_err(|source| RewriteError::Update {
                    id: activity.id,
                    source,
                })?;
        }
        translated += 1;
    }
    Ok(translated)
}

pub async fn run<C>(
    client: &C,
    translator: &Translator,
    opts: &RewriteOptions,
) -> RewriteResult<RewriteSummary>
where
    C: StravaClient + ?Sized,
{
    let athlete = client
        .get_athlete(&opts.call_context())
        .await
        .map_err(RewriteError::Athlete)?;
    info!(
        id = athlete.id,
        username = %athlete.username,
        first_name = %athlete.first_name,
        last_name = %athlete.last_name,
        city = %athlete.city,
        "current logged in athlete"
    );

    let activities = fetch_activities(client, opts).await?;
    info!(from = %opts.from, to = %opts.to, count = activities.len(), "number of activities");

    let translated = rename_activities(client, translator, opts, &activities).await?;
    if opts.dry_run {
        info!(translated, "dry run, no activities were updated");
    } else {
        info!(translated, "number of translated activities");
    }

    Ok(RewriteSummary {
        athlete,
        fetched: activities.len(),
        translated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockClient, activity, full_page};
    use chrono::TimeZone;
    use strava_client::StravaError;

    fn opts() -> RewriteOptions {
        RewriteOptions::new(
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 12, 31, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn fetch_stops_after_short_page() {
        let client = MockClient::with_pages(vec![
            Ok(full_page(0)),
            Ok(vec![activity(1000, "Утренний забег")]),
        ]);
        let acts = fetch_activities(&client, &opts()).await.expect("fetch");
        assert_eq!(acts.len(), 101);
        assert_eq!(client.pages_requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn fetch_tolerates_empty_page_after_full_one() {
        let client = MockClient::with_pages(vec![Ok(full_page(0)), Ok(vec![])]);
        let acts = fetch_activities(&client, &opts()).await.expect("fetch");
        assert_eq!(acts.len(), 100);
        assert_eq!(client.pages_requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn fetch_stop_policy_keeps_partial_results() {
        let client = MockClient::with_pages(vec![
            Ok(full_page(0)),
            Err(StravaError::transport("connection reset")),
        ]);
        let acts = fetch_activities(&client, &opts()).await.expect("fetch");
        assert_eq!(acts.len(), 100);
    }

    #[tokio::test]
    async fn fetch_abort_policy_fails_run() {
        let client = MockClient::with_pages(vec![
            Ok(full_page(0)),
            Err(StravaError::Upstream {
                status: "500 Internal Server Error".into(),
                body: String::new(),
            }),
        ]);
        let mut o = opts();
        o.on_page_error = PageErrorPolicy::Abort;
        let err = fetch_activities(&client, &o).await.unwrap_err();
        assert!(matches!(err, RewriteError::Page { page: 2, .. }));
    }

    #[tokio::test]
    async fn fetch_invalid_range_follows_page_policy() {
        let invalid = || {
            MockClient::with_pages(vec![Err(StravaError::InvalidArgument(
                "to date must be after from date".into(),
            ))])
        };

        let client = invalid();
        let acts = fetch_activities(&client, &opts()).await.expect("fetch");
        assert!(acts.is_empty());
        assert_eq!(client.pages_requested(), vec![1]);

        let mut o = opts();
        o.on_page_error = PageErrorPolicy::Abort;
        let err = fetch_activities(&invalid(), &o).await.unwrap_err();
        assert!(matches!(err, RewriteError::Page { page: 1, .. }));
    }

    #[tokio::test]
    async fn rename_updates_only_changed_names() {
        let client = MockClient::default();
        let acts = vec![
            activity(1, "Утренний забег"),
            activity(2, "Evening Run"),
            activity(3, "Recovery"),
            activity(4, "Ночная ходьба"),
        ];
        let n = rename_activities(&client, &Translator::new(), &opts(), &acts)
            .await
            .expect("rename");
        assert_eq!(n, 2);
        assert_eq!(
            client.updates(),
            vec![(1, "Morning Run".to_string()), (4, "Night Walk".to_string())]
        );
    }

    #[tokio::test]
    async fn rename_fails_fast_on_first_update_error() {
        let client = MockClient::default().failing_update(1);
        let acts = vec![activity(1, "Утренний забег"), activity(2, "Ночная ходьба")];
        let err = rename_activities(&client, &Translator::new(), &opts(), &acts)
            .await
            .unwrap_err();
        assert!(matches!(err, RewriteError::Update { id: 1, .. }));
        assert!(client.updates().is_empty());
    }

    #[tokio::test]
    async fn dry_run_sends_no_updates() {
        let client = MockClient::default();
        let mut o = opts();
        o.dry_run = true;
        let acts = vec![activity(1, "Утренний забег")];
        let n = rename_activities(&client, &Translator::new(), &o, &acts)
            .await
            .expect("rename");
        assert_eq!(n, 1);
        assert!(client.updates().is_empty());
    }

    #[tokio::test]
    async fn run_reports_summary() {
        let client = MockClient::with_pages(vec![Ok(vec![
            activity(1, "Вечерняя тренировка"),
            activity(2, "Lunch Ride"),
        ])]);
        let summary = run(&client, &Translator::new(), &opts()).await.expect("run");
        assert_eq!(summary.athlete.id, 42);
        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.translated, 1);
        assert_eq!(client.updates(), vec![(1, "Evening Workout".to_string())]);
    }

    #[tokio::test]
    async fn run_fails_when_athlete_unavailable() {
        let client = MockClient::default().failing_athlete();
        let err = run(&client, &Translator::new(), &opts()).await.unwrap_err();
        assert!(matches!(err, RewriteError::Athlete(_)));
        assert!(client.pages_requested().is_empty());
    }

    #[test]
    fn call_context_carries_timeout() {
        let mut o = opts();
        assert!(o.call_context().deadline().is_none());
        o.call_timeout = Some(Duration::from_secs(30));
        assert!(o.call_context().deadline().is_some());
    }
}

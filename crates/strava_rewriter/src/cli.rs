//! Command-line arguments.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use secrecy::SecretString;
use strava_client::config::{Config, DEFAULT_BASE_URL};

use crate::rewriter::{PageErrorPolicy, RewriteOptions};

#[derive(Debug, Parser)]
#[command(
    name = "strava-rewriter",
    about = "Translate Russian Strava activity names to English",
    long_about = "Rename activities like \"Утренний забег\" to \"Morning Run\" for every activity started between --from and --to.\n\nExample:\n  strava-rewriter --access-token <access_token> --from 2021-01-01 --to 2021-12-31\n\nFlags take two dashes: the single-dash `-accessToken` form is spelled `--accessToken` (or `--access-token`) here."
)]
pub struct Cli {
    /// Strava access_token with read and write activities permissions
    #[arg(
        long = "access-token",
        alias = "accessToken",
        env = "STRAVA_ACCESS_TOKEN",
        hide_env_values = true,
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    pub access_token: String,

    /// Start date in format 'YYYY-MM-DD'
    #[arg(long, value_parser = parse_date)]
    pub from: NaiveDate,

    /// Finish date in format 'YYYY-MM-DD'
    #[arg(long, value_parser = parse_date)]
    pub to: NaiveDate,

    /// Print debug information, including every API response
    #[arg(long)]
    pub debug: bool,

    /// What to do when a page of activities cannot be fetched
    #[arg(long, value_enum, default_value_t = PageErrorPolicy::Stop)]
    pub on_page_error: PageErrorPolicy,

    /// Show the renames without updating any activity
    #[arg(long)]
    pub dry_run: bool,

    /// Give up on a single API call after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Seconds between two API requests
    #[arg(long, env = "STRAVA_RATE_LIMIT_INTERVAL_SECS", default_value_t = 9)]
    pub rate_limit_interval_secs: u64,

    #[arg(long, env = "STRAVA_BASE_URL", default_value = DEFAULT_BASE_URL, hide = true)]
    pub base_url: String,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

impl Cli {
    pub fn client_config(&self) -> Config {
        Config {
            access_token: SecretString::new(self.access_token.clone().into()),
            base_url: self.base_url.clone(),
            rate_limit_interval: Duration::from_secs(self.rate_limit_interval_secs),
        }
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        let mut opts = RewriteOptions::new(start_of_day(self.from), start_of_day(self.to));
        opts.on_page_error = self.on_page_error;
        opts.dry_run = self.dry_run;
        opts.call_timeout = self.timeout_secs.map(Duration::from_secs);
        opts
    }
}

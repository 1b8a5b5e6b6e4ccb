//! Translate Strava activity names written in Russian to English.
//!
//! [`rewriter::run`] drives a [`strava_client::StravaClient`]: it pages
//! through the athlete's activities in a date range and renames every
//! activity whose default "time of day + sport" name translates.

pub mod cli;
pub mod error;
pub mod rewriter;
pub mod translate;

mod test_utils;

pub use error::{RewriteError, RewriteResult};
pub use rewriter::{PageErrorPolicy, RewriteOptions, RewriteSummary};
pub use translate::Translator;

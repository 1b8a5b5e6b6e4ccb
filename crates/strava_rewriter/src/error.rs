//! Error types for the rewrite run.

use strava_client::StravaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to get athlete: {0}")]
    Athlete(#[source] StravaError),

    #[error("failed to get activities for page={page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: StravaError,
    },

    #[error("failed to update activity={id}: {source}")]
    Update {
        id: i64,
        #[source]
        source: StravaError,
    },
}

/// Result type alias for rewrite operations.
pub type RewriteResult<T> = Result<T, RewriteError>;

//! Per-call cancellation and deadline.
//!
//! A [`CallContext`] bounds one client call end to end: the rate limiter wait,
//! the request and the body read. When the deadline passes or the cancel
//! channel flips to `true`, the call is dropped and surfaces as a
//! [`StravaError::Transport`].

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::StravaError;

#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl CallContext {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Keeps the earlier deadline when one is already set.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Drive `fut` to completion unless the context fires first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, StravaError>
    where
        F: Future<Output = Result<T, StravaError>>,
    {
        if self.is_cancelled() {
            return Err(StravaError::transport("context cancelled"));
        }
        if self.is_expired() {
            return Err(StravaError::transport("context deadline exceeded"));
        }

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        let cancelled = async {
            let Some(mut rx) = self.cancel.clone() else {
                return std::future::pending::<()>().await;
            };
            loop {
                if *rx.borrow_and_update() {
                    return;
                }
                // sender gone: nobody can cancel any more
                if rx.changed().await.is_err() {
                    return std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(StravaError::transport("context cancelled")),
            _ = deadline => Err(StravaError::transport("context deadline exceeded")),
            res = fut => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_runs_to_completion() {
        let ctx = CallContext::background();
        let res = ctx.run(async { Ok::<_, StravaError>(42) }).await;
        assert_eq!(res.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_pending_work() {
        let ctx = CallContext::background().with_timeout(Duration::from_secs(1));
        let res = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, StravaError>(())
            })
            .await;
        let err = res.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("deadline"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_aborts_pending_work() {
        let (tx, rx) = watch::channel(false);
        let ctx = CallContext::background().with_cancel(rx);
        let handle = tokio::spawn(async move {
            ctx.run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, StravaError>(())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(true).expect("send cancel");
        let err = handle.await.expect("join").unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    #[tokio::test]
    async fn already_cancelled_skips_work() {
        let (_tx, rx) = watch::channel(true);
        let ctx = CallContext::background().with_cancel(rx);
        let res = ctx.run(async { Ok::<_, StravaError>(1) }).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn dropped_sender_never_cancels() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let ctx = CallContext::background().with_cancel(rx);
        let res = ctx.run(async { Ok::<_, StravaError>("done") }).await;
        assert_eq!(res.unwrap(), "done");
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = CallContext::background()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }
}

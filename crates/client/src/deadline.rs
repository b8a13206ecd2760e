//! Per-call deadline scoping.
//!
//! Every public operation takes its own millisecond budget. A positive
//! budget becomes an absolute [`Deadline`]; zero or negative means no
//! bound. Budgets are never shared between calls on one instance.
//!
//! When a deadline fires the operation's future is dropped, which aborts
//! the in-flight RPC and releases its timer. The same happens on success,
//! on error and on unwind, since all of it is owned by the scope.

use crate::error::{ClientError, Result};
use std::future::Future;
use tokio::time::{Duration, Instant};

/// Largest budget a `grpc-timeout` header can express: eight digits of hours.
pub const MAX_GRPC_TIMEOUT: Duration = Duration::from_secs(99_999_999 * 3600);

/// An optional absolute deadline for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
    budget_ms: i64,
}

impl Deadline {
    /// Deadline `timeout_ms` from now; unbounded if `timeout_ms <= 0` or
    /// if the instant is past what the clock can represent.
    pub fn after_millis(timeout_ms: i64) -> Self {
        let at = (timeout_ms > 0)
            .then(|| {
                Instant::now().checked_add(Duration::from_millis(timeout_ms.unsigned_abs()))
            })
            .flatten();
        Self {
            at,
            budget_ms: timeout_ms,
        }
    }

    pub fn unbounded() -> Self {
        Self::after_millis(0)
    }

    pub fn is_bounded(&self) -> bool {
        self.at.is_some()
    }

    pub fn instant(&self) -> Option<Instant> {
        self.at
    }

    /// The budget this deadline was derived from.
    pub fn budget_ms(&self) -> i64 {
        self.budget_ms
    }

    /// Time left, or `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Propagate the remaining budget to the store as `grpc-timeout`,
    /// clamped to [`MAX_GRPC_TIMEOUT`].
    pub fn apply<T>(&self, request: &mut tonic::Request<T>) {
        if let Some(remaining) = self.remaining() {
            request.set_timeout(remaining.min(MAX_GRPC_TIMEOUT));
        }
    }
}

/// Run `op` under a deadline derived from `timeout_ms`.
///
/// Returns [`ClientError::DeadlineExceeded`] if the deadline fires first.
pub async fn scoped<T, F, Fut>(timeout_ms: i64, op: F) -> Result<T>
where
    F: FnOnce(Deadline) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let deadline = Deadline::after_millis(timeout_ms);
    match deadline.instant() {
        Some(at) => match tokio::time::timeout_at(at, op(deadline)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(timeout_ms, "deadline fired, call aborted");
                Err(ClientError::DeadlineExceeded(timeout_ms))
            }
        },
        None => op(deadline).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_non_positive_budget_is_unbounded() {
        for budget in [0, -1, i64::MIN] {
            let d = Deadline::after_millis(budget);
            assert!(!d.is_bounded());
            assert_eq!(d.remaining(), None);
            assert_eq!(d.budget_ms(), budget);
        }
        assert_eq!(Deadline::unbounded().budget_ms(), 0);
    }

    #[tokio::test]
    async fn test_positive_budget_is_bounded() {
        let d = Deadline::after_millis(500);
        assert!(d.is_bounded());
        let remaining = d.remaining().unwrap();
        assert!(remaining <= Duration::from_millis(500));
        assert!(remaining > Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_apply_sets_grpc_timeout() {
        let mut bounded = tonic::Request::new(());
        Deadline::after_millis(1000).apply(&mut bounded);
        assert!(bounded.metadata().get("grpc-timeout").is_some());

        let mut unbounded = tonic::Request::new(());
        Deadline::unbounded().apply(&mut unbounded);
        assert!(unbounded.metadata().get("grpc-timeout").is_none());
    }

    #[tokio::test]
    async fn test_apply_clamps_huge_budget() {
        for budget in [i64::MAX, 1_000_000_000_000_000] {
            let d = Deadline::after_millis(budget);
            assert!(d.is_bounded());
            let mut request = tonic::Request::new(());
            d.apply(&mut request);
            assert_eq!(
                request.metadata().get("grpc-timeout").unwrap(),
                "99999999H"
            );
        }
    }

    #[tokio::test]
    async fn test_unbounded_runs_to_completion() {
        let result = scoped(0, |d| async move {
            assert!(!d.is_bounded());
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);

        let result = scoped(-5, |_| async { Ok("negative") }).await;
        assert_eq!(result.unwrap(), "negative");
    }

    #[tokio::test]
    async fn test_bounded_success() {
        let result = scoped(1000, |d| async move {
            assert!(d.is_bounded());
            Ok(1)
        })
        .await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: Result<()> = scoped(1000, |_| async {
            Err(ClientError::Connect("refused".into()))
        })
        .await;
        assert!(matches!(result, Err(ClientError::Connect(msg)) if msg == "refused"));
    }

    #[tokio::test]
    async fn test_deadline_fires_within_slack() {
        let start = std::time::Instant::now();
        let result: Result<()> = scoped(1, |_| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(ClientError::DeadlineExceeded(1))));
        assert!(
            elapsed < Duration::from_millis(51),
            "deadline took {:?} to fire",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_deadline_drops_in_flight_operation() {
        let held = Arc::new(());
        let in_op = held.clone();
        let result: Result<()> = scoped(5, move |_| async move {
            let _keep = in_op;
            std::future::pending::<()>().await;
            Ok(())
        })
        .await;

        assert!(result.unwrap_err().is_deadline_exceeded());
        // The aborted future and everything it owned is gone.
        assert_eq!(Arc::strong_count(&held), 1);
    }
}

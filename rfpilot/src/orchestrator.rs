//! Bounded-retry wrapper around named operations.
//!
//! The orchestrator is a consumer of the core: it never reaches below the
//! state machine and workflow entry points. Connection loss bypasses the
//! retry loop entirely; retrying against a dead page only buries the
//! useful error.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::errors::AutomationError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(2_000),
        }
    }
}

/// Run `op` up to `policy.attempts` times.
///
/// Fatal errors (connection loss) are re-raised immediately on first
/// occurrence; everything else is retried with a fixed delay, and the
/// last error is returned when the bound is exhausted.
pub async fn run_with_retry<T, F, Fut>(
    name: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, AutomationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AutomationError>>,
{
    let mut last_error = None;
    for attempt in 1..=policy.attempts.max(1) {
        if attempt > 1 {
            tokio::time::sleep(policy.backoff).await;
        }
        info!(operation = name, attempt, of = policy.attempts, "running operation");
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_fatal() => {
                warn!(operation = name, error = %e, "fatal error, not retrying");
                return Err(e);
            }
            Err(e) => {
                warn!(operation = name, attempt, error = %e, "operation attempt failed");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        AutomationError::InvalidArgument(format!("retry policy for '{name}' allows no attempts"))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retries_ui_errors_up_to_the_bound() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = run_with_retry("scan", &quick(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(AutomationError::UiError("invalid item".into())) }
        })
        .await;
        assert!(matches!(result, Err(AutomationError::UiError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_midway_and_stops_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = run_with_retry("scan", &quick(), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(AutomationError::ScreenTimeout("no ack".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn connection_loss_is_never_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = run_with_retry("receive", &quick(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(AutomationError::ConnectionLost("page reset".into())) }
        })
        .await;
        assert!(matches!(result, Err(AutomationError::ConnectionLost(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

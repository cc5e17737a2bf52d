//! Change-wait protocol: the stand-in for an acknowledgement channel.
//!
//! After every simulated keystroke the only evidence that the terminal
//! accepted the input is that its rendered text eventually differs from
//! what was on screen before. This module polls a snapshot provider at a
//! fixed short interval until the digest changes or a timeout elapses.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::AutomationError;
use crate::snapshot::Snapshot;

/// Error-message fragments that mean the nested frame was torn down by a
/// navigation mid-poll. The disappearance itself is the change we were
/// waiting for.
const TRANSIENT_NAVIGATION_SIGNATURES: &[&str] = &[
    "execution context was destroyed",
    "context was destroyed",
    "detached",
    "target closed",
    "frame not found",
    "no frame",
    "cannot find context",
];

/// Polling parameters for [`wait_for_change`].
///
/// The interval is intentionally short and fixed, no backoff: the RF
/// terminal's redraw latency is small and bounded, so a fixed poll keeps
/// both CPU churn and worst-case detection latency low.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(25_000),
            interval: Duration::from_millis(200),
        }
    }
}

pub fn is_transient_navigation(err: &AutomationError) -> bool {
    let message = match err {
        AutomationError::PlatformError(m) | AutomationError::ElementNotFound(m) => m,
        _ => return false,
    };
    let lower = message.to_lowercase();
    TRANSIENT_NAVIGATION_SIGNATURES
        .iter()
        .any(|sig| lower.contains(sig))
}

/// Poll `provider` until it yields a snapshot differing from `before`.
///
/// The provider is re-invoked on every tick rather than captured once:
/// navigation can replace the frame identity mid-wait, and only the
/// provider knows how to re-resolve the live frame.
///
/// Returns `Ok(true)` as soon as a difference is observed, `Ok(false)`
/// if the timeout elapses with no change. A provider error carrying a
/// transient navigation signature counts as change observed; any other
/// provider error propagates.
pub async fn wait_for_change<P, Fut>(
    provider: P,
    before: &Snapshot,
    config: &WaitConfig,
) -> Result<bool, AutomationError>
where
    P: Fn() -> Fut,
    Fut: Future<Output = Result<Snapshot, AutomationError>>,
{
    let started = Instant::now();
    let deadline = started + config.timeout;

    loop {
        tokio::time::sleep(config.interval).await;

        match provider().await {
            Ok(current) => {
                if current != *before {
                    debug!(
                        before = %before,
                        after = %current,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "screen change observed"
                    );
                    return Ok(true);
                }
            }
            Err(e) if is_transient_navigation(&e) => {
                debug!(error = %e, "frame torn down mid-wait, treating as change");
                return Ok(true);
            }
            Err(e) => return Err(e),
        }

        if Instant::now() >= deadline {
            warn!(
                timeout_ms = config.timeout.as_millis() as u64,
                "screen did not change before timeout"
            );
            return Ok(false);
        }
    }
}

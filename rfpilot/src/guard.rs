//! Connection-loss guard.
//!
//! The browser renders a fatal network-error page silently, with no error
//! surfaced to the automation layer; from the frame's point of view it
//! just looks like another screen change. The guard inspects the
//! top-level page for network-failure signatures and, once tripped, makes
//! every guarded operation fail fast with a distinguished error.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, error, warn};

use crate::drivers::TerminalDriver;
use crate::errors::AutomationError;
use crate::screenshot::ScreenshotSink;

/// URL scheme prefix the browser uses for its internal error pages.
const ERROR_SCHEME_PREFIX: &str = "chrome-error://";

/// Case-insensitive body-text phrases that identify a network-failure
/// page. Both apostrophe variants of "can't" appear in the wild.
const FAILURE_PHRASES: &[&str] = &[
    "connection was reset",
    "err_connection_reset",
    "this site can't be reached",
    "this site can\u{2019}t be reached",
];

/// One-way UNTRIPPED -> TRIPPED latch scoped to a single browser page.
///
/// Shared by reference across every operation running against the page;
/// owned by the session bootstrap. The trip reason is monotonic: first
/// reason wins, later trips are no-ops.
pub struct ConnectionGuard {
    tripped: OnceCell<String>,
    screenshots: Arc<dyn ScreenshotSink>,
}

impl ConnectionGuard {
    pub fn new(screenshots: Arc<dyn ScreenshotSink>) -> Self {
        Self {
            tripped: OnceCell::new(),
            screenshots,
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.get().is_some()
    }

    pub fn trip_reason(&self) -> Option<&str> {
        self.tripped.get().map(String::as_str)
    }

    /// Latch the guard with a reason. Idempotent: a second trip keeps the
    /// first reason and does not re-capture the diagnostic screenshot.
    pub async fn trip(&self, reason: impl Into<String>) {
        let reason = reason.into();
        match self.tripped.set(reason.clone()) {
            Ok(()) => {
                error!(reason = %reason, "connection guard tripped");
                // Best effort; the page may already be unreachable.
                if let Err(e) = self
                    .screenshots
                    .capture("connection-lost", Some(&reason))
                    .await
                {
                    warn!(error = %e, "diagnostic screenshot failed");
                }
            }
            Err(_) => debug!(reason = %reason, "guard already tripped, ignoring"),
        }
    }

    /// Inspect one top-level page observation (URL plus visible body
    /// text) and trip on the first network-failure signature.
    pub async fn observe(&self, url: &str, body_text: &str) {
        if self.is_tripped() {
            return;
        }
        if url.starts_with(ERROR_SCHEME_PREFIX) {
            self.trip(format!("browser error page: {url}")).await;
            return;
        }
        let lower = body_text.to_lowercase();
        if let Some(phrase) = FAILURE_PHRASES.iter().find(|p| lower.contains(**p)) {
            self.trip(format!("network failure text on page: \"{phrase}\""))
                .await;
        }
    }

    /// Read the top-level page through the driver and [`observe`] it.
    ///
    /// Invoked at operation boundaries and wait-loop ticks; the target
    /// page offers no reliable navigation callback, so probing is how
    /// lifecycle events reach the guard.
    pub async fn probe(&self, driver: &dyn TerminalDriver) {
        if self.is_tripped() {
            return;
        }
        let url = match driver.page_url().await {
            Ok(u) => u,
            Err(e) => {
                debug!(error = %e, "guard probe could not read page url");
                return;
            }
        };
        let body = driver.page_body_text().await.unwrap_or_default();
        self.observe(&url, &body).await;
    }

    /// Precondition check: fails with `ConnectionLost` if tripped.
    pub fn ensure_ok(&self) -> Result<(), AutomationError> {
        match self.tripped.get() {
            Some(reason) => Err(AutomationError::ConnectionLost(reason.clone())),
            None => Ok(()),
        }
    }

    /// Finally-semantics resolution for a guarded operation: if the guard
    /// tripped while the operation ran, the tripped-guard error takes
    /// priority over whatever the operation returned — the operation's
    /// failure is usually just a symptom of the same dead page.
    pub fn resolve<T>(
        &self,
        result: Result<T, AutomationError>,
    ) -> Result<T, AutomationError> {
        self.ensure_ok()?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        captures: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ScreenshotSink for CountingSink {
        async fn capture(
            &self,
            _label: &str,
            _overlay: Option<&str>,
        ) -> Result<PathBuf, AutomationError> {
            self.captures.fetch_add(1, Ordering::SeqCst);
            Ok(PathBuf::new())
        }

        async fn capture_region(
            &self,
            _label: &str,
            _overlay: Option<&str>,
        ) -> Result<PathBuf, AutomationError> {
            Ok(PathBuf::new())
        }
    }

    fn guard_with_counter() -> (ConnectionGuard, Arc<CountingSink>) {
        let sink = Arc::new(CountingSink {
            captures: AtomicUsize::new(0),
        });
        (ConnectionGuard::new(sink.clone()), sink)
    }

    #[tokio::test]
    async fn error_scheme_url_trips_the_guard() {
        let (guard, _) = guard_with_counter();
        guard
            .observe("chrome-error://chromewebdata/", "Aw, Snap!")
            .await;
        assert!(guard.is_tripped());
        assert!(guard.ensure_ok().is_err());
    }

    #[tokio::test]
    async fn failure_phrases_trip_case_insensitively() {
        for body in [
            "The connection was RESET",
            "net::ERR_CONNECTION_RESET",
            "This site can't be reached",
            "This site can\u{2019}t be reached",
        ] {
            let (guard, _) = guard_with_counter();
            guard.observe("https://wms.example/rf", body).await;
            assert!(guard.is_tripped(), "body should trip: {body}");
        }
    }

    #[tokio::test]
    async fn healthy_page_does_not_trip() {
        let (guard, _) = guard_with_counter();
        guard.observe("https://wms.example/rf", "ASN: _").await;
        assert!(guard.ensure_ok().is_ok());
    }

    #[tokio::test]
    async fn trip_is_monotonic_and_screenshot_fires_once() {
        let (guard, sink) = guard_with_counter();
        guard.trip("first reason").await;
        guard.trip("second reason").await;
        assert_eq!(guard.trip_reason(), Some("first reason"));
        assert_eq!(sink.captures.load(Ordering::SeqCst), 1);

        // Later navigation observations never clear the latch.
        guard.observe("https://wms.example/rf", "ASN: _").await;
        assert!(matches!(
            guard.ensure_ok(),
            Err(AutomationError::ConnectionLost(r)) if r == "first reason"
        ));
    }

    #[tokio::test]
    async fn resolve_prefers_the_guard_error_over_the_operations() {
        let (guard, _) = guard_with_counter();
        guard.trip("page went away").await;
        let op_result: Result<(), AutomationError> =
            Err(AutomationError::UiError("field not found".into()));
        assert!(matches!(
            guard.resolve(op_result),
            Err(AutomationError::ConnectionLost(_))
        ));
    }
}

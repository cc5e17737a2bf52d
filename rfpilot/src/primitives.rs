//! RF primitive layer: atomic UI actions against the terminal frame.
//!
//! Every primitive follows one contract shape: capture a before-snapshot,
//! perform the DOM action, wait for the screen to change when a change is
//! expected, then classify the resulting text. A labeled screenshot is
//! captured on every call for audit.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classify::{classify_with_message, ScreenClass};
use crate::config::RfOptions;
use crate::drivers::TerminalDriver;
use crate::errors::AutomationError;
use crate::guard::ConnectionGuard;
use crate::screenshot::ScreenshotSink;
use crate::snapshot::frame_snapshot;
use crate::wait::wait_for_change;

/// Result of one primitive action.
///
/// `message` without `has_error` is an informational banner the caller
/// may react to but must not treat as failure.
#[derive(Debug, Clone)]
pub struct FieldOutcome {
    pub has_error: bool,
    pub message: Option<String>,
}

impl FieldOutcome {
    /// Promote an error outcome to a `UiError`, passing success through.
    pub fn into_result(self) -> Result<FieldOutcome, AutomationError> {
        if self.has_error {
            Err(AutomationError::UiError(
                self.message
                    .unwrap_or_else(|| "unclassified screen error".into()),
            ))
        } else {
            Ok(self)
        }
    }
}

/// Atomic RF actions sharing one driver, guard, and screenshot sink.
pub struct RfPrimitives {
    driver: Arc<dyn TerminalDriver>,
    guard: Arc<ConnectionGuard>,
    screenshots: Arc<dyn ScreenshotSink>,
    options: RfOptions,
}

impl RfPrimitives {
    pub fn new(
        driver: Arc<dyn TerminalDriver>,
        guard: Arc<ConnectionGuard>,
        screenshots: Arc<dyn ScreenshotSink>,
        options: RfOptions,
    ) -> Self {
        Self {
            driver,
            guard,
            screenshots,
            options,
        }
    }

    pub fn driver(&self) -> &Arc<dyn TerminalDriver> {
        &self.driver
    }

    pub fn guard(&self) -> &Arc<ConnectionGuard> {
        &self.guard
    }

    pub fn options(&self) -> &RfOptions {
        &self.options
    }

    /// Current visible text of the RF frame.
    pub async fn frame_text(&self) -> Result<String, AutomationError> {
        self.guard.ensure_ok()?;
        let result = self.driver.frame_text().await;
        self.guard.probe(self.driver.as_ref()).await;
        self.guard.resolve(result)
    }

    /// Fill a field and submit, waiting for the screen to acknowledge.
    pub async fn fill_and_submit(
        &self,
        field: &str,
        value: &str,
        label: &str,
    ) -> Result<FieldOutcome, AutomationError> {
        self.guard.ensure_ok()?;
        let result = self
            .act(label, true, || async move {
                self.driver.fill_field(field, value).await?;
                self.driver.submit_field(field).await
            })
            .await;
        self.guard.probe(self.driver.as_ref()).await;
        self.guard.resolve(result)
    }

    /// Fill without submitting; no screen change is expected.
    pub async fn fill_only(
        &self,
        field: &str,
        value: &str,
        label: &str,
    ) -> Result<(), AutomationError> {
        self.guard.ensure_ok()?;
        let result = self.driver.fill_field(field, value).await;
        let shot = self.screenshots.capture_region(label, None).await;
        if let Err(e) = shot {
            warn!(label, error = %e, "audit screenshot failed");
        }
        self.guard.probe(self.driver.as_ref()).await;
        self.guard.resolve(result)
    }

    /// Submit a previously filled field.
    pub async fn submit(
        &self,
        field: &str,
        label: &str,
    ) -> Result<FieldOutcome, AutomationError> {
        self.guard.ensure_ok()?;
        let result = self
            .act(label, true, || async move { self.driver.submit_field(field).await })
            .await;
        self.guard.probe(self.driver.as_ref()).await;
        self.guard.resolve(result)
    }

    /// Send a key combination to the frame.
    pub async fn send_key(
        &self,
        combo: &str,
        label: &str,
        expect_change: bool,
    ) -> Result<FieldOutcome, AutomationError> {
        self.guard.ensure_ok()?;
        let result = self
            .act(label, expect_change, || async move {
                self.driver.send_key(combo).await
            })
            .await;
        self.guard.probe(self.driver.as_ref()).await;
        self.guard.resolve(result)
    }

    /// Click an element by its text.
    pub async fn click_text(
        &self,
        text: &str,
        label: &str,
        expect_change: bool,
    ) -> Result<FieldOutcome, AutomationError> {
        self.guard.ensure_ok()?;
        let result = self
            .act(label, expect_change, || async move {
                self.driver.click_text(text).await
            })
            .await;
        self.guard.probe(self.driver.as_ref()).await;
        self.guard.resolve(result)
    }

    /// Read back a field's current value.
    pub async fn read_field(&self, field: &str) -> Result<String, AutomationError> {
        self.guard.ensure_ok()?;
        let result = self.driver.read_field(field).await;
        self.guard.probe(self.driver.as_ref()).await;
        self.guard.resolve(result)
    }

    /// Shared action shape: before-snapshot, act, wait, classify, shoot.
    async fn act<F, Fut>(
        &self,
        label: &str,
        expect_change: bool,
        action: F,
    ) -> Result<FieldOutcome, AutomationError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(), AutomationError>>,
    {
        let before = frame_snapshot(self.driver.as_ref()).await?;
        if self.options.log.verbose_wait {
            debug!(label, before = %before, "captured pre-action snapshot");
        }
        action().await?;

        if expect_change {
            let driver = self.driver.clone();
            let changed = wait_for_change(
                || {
                    let d = driver.clone();
                    async move { frame_snapshot(d.as_ref()).await }
                },
                &before,
                &self.options.wait,
            )
            .await?;
            if !changed {
                // The screen never acknowledged the input; do not guess.
                self.shoot(label, Some("screen did not change")).await;
                return Err(AutomationError::ScreenTimeout(format!(
                    "screen did not change after {label}"
                )));
            }
        }

        let text = match self.driver.frame_text().await {
            Ok(t) => t,
            // A teardown right after the change is the navigation settling.
            Err(e) if crate::wait::is_transient_navigation(&e) => {
                debug!(label, "frame replaced right after action");
                String::new()
            }
            Err(e) => return Err(e),
        };

        let (class, message) = classify_with_message(&text);
        if self.options.log.verbose_rf {
            info!(
                label,
                class = ?class,
                preview = %text.chars().take(120).collect::<String>(),
                "rf action complete"
            );
        }
        self.shoot(label, message.as_deref()).await;

        Ok(FieldOutcome {
            has_error: class == ScreenClass::Error,
            message,
        })
    }

    async fn shoot(&self, label: &str, overlay: Option<&str>) {
        if let Err(e) = self.screenshots.capture(label, overlay).await {
            warn!(label, error = %e, "audit screenshot failed");
        }
    }
}

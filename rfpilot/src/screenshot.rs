//! Screenshot capture for audit and post-run diagnosis.
//!
//! Every primitive action captures a labeled screenshot; callers never
//! inspect the returned handle for control flow.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::drivers::TerminalDriver;
use crate::errors::AutomationError;

/// Side-effecting screenshot collaborator shared across all operations on
/// one page.
#[async_trait]
pub trait ScreenshotSink: Send + Sync {
    /// Capture the full top-level page.
    async fn capture(
        &self,
        label: &str,
        overlay: Option<&str>,
    ) -> Result<PathBuf, AutomationError>;

    /// Capture just the RF terminal frame.
    async fn capture_region(
        &self,
        label: &str,
        overlay: Option<&str>,
    ) -> Result<PathBuf, AutomationError>;
}

/// Writes timestamped PNGs under a directory, one file per capture.
///
/// An overlay note, when supplied, lands in a sidecar `.txt` next to the
/// image since the raw CDP capture has no annotation channel.
pub struct FileScreenshotSink {
    driver: Arc<dyn TerminalDriver>,
    dir: PathBuf,
}

impl FileScreenshotSink {
    pub fn new(driver: Arc<dyn TerminalDriver>, dir: impl AsRef<Path>) -> Self {
        Self {
            driver,
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn target_path(&self, label: &str) -> PathBuf {
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S%.3f");
        // Labels come from call sites and may contain spaces; the uuid
        // tail keeps rapid captures under one label distinct.
        let slug: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let tail = uuid::Uuid::new_v4().simple().to_string();
        self.dir.join(format!("{stamp}-{slug}-{}.png", &tail[..8]))
    }

    async fn write(
        &self,
        label: &str,
        overlay: Option<&str>,
        png: Vec<u8>,
    ) -> Result<PathBuf, AutomationError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AutomationError::PlatformError(format!("screenshot dir: {e}")))?;
        let path = self.target_path(label);
        tokio::fs::write(&path, png)
            .await
            .map_err(|e| AutomationError::PlatformError(format!("screenshot write: {e}")))?;
        if let Some(note) = overlay {
            let sidecar = path.with_extension("txt");
            if let Err(e) = tokio::fs::write(&sidecar, note).await {
                warn!(error = %e, "failed to write screenshot note");
            }
        }
        debug!(label, path = %path.display(), "screenshot captured");
        Ok(path)
    }
}

#[async_trait]
impl ScreenshotSink for FileScreenshotSink {
    async fn capture(
        &self,
        label: &str,
        overlay: Option<&str>,
    ) -> Result<PathBuf, AutomationError> {
        let png = self.driver.screenshot_png().await?;
        self.write(label, overlay, png).await
    }

    async fn capture_region(
        &self,
        label: &str,
        overlay: Option<&str>,
    ) -> Result<PathBuf, AutomationError> {
        let png = self.driver.frame_screenshot_png().await?;
        self.write(label, overlay, png).await
    }
}

/// Discards every capture. Used in tests and headless smoke runs.
pub struct NullScreenshotSink;

#[async_trait]
impl ScreenshotSink for NullScreenshotSink {
    async fn capture(
        &self,
        _label: &str,
        _overlay: Option<&str>,
    ) -> Result<PathBuf, AutomationError> {
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

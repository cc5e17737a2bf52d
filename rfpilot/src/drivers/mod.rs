//! Driver boundary between the automation layers and the browser.
//!
//! Everything above this trait (primitives, workflows, the receive state
//! machine) only ever sees rendered text and field names; the driver owns
//! how those map onto a real page. The production implementation drives
//! Chrome over the DevTools protocol; tests substitute a scripted fake.

use async_trait::async_trait;

use crate::errors::AutomationError;

pub mod chrome;

pub use chrome::{ChromeConfig, ChromeTerminal};

/// Low-level access to the RF terminal rendered inside a nested frame of
/// the top-level page.
///
/// Frame-scoped methods (`frame_text`, `fill_field`, ...) address the RF
/// terminal's sub-document; `page_url` and `page_body_text` read the
/// top-level page, which is what the connection guard inspects.
#[async_trait]
pub trait TerminalDriver: Send + Sync {
    /// Visible text of the RF terminal frame.
    ///
    /// Fails (rather than returning empty) when the frame is detached or
    /// mid-replacement; the change-wait protocol treats that as content
    /// in flux, not as a crash.
    async fn frame_text(&self) -> Result<String, AutomationError>;

    /// Current URL of the top-level page.
    async fn page_url(&self) -> Result<String, AutomationError>;

    /// Visible body text of the top-level page.
    async fn page_body_text(&self) -> Result<String, AutomationError>;

    /// Set an input field's value inside the RF frame, leaving focus on it.
    async fn fill_field(&self, field: &str, value: &str) -> Result<(), AutomationError>;

    /// Submit the form owning the named field (Enter on the field).
    async fn submit_field(&self, field: &str) -> Result<(), AutomationError>;

    /// Read back an input field's current value.
    async fn read_field(&self, field: &str) -> Result<String, AutomationError>;

    /// Send a key or key combination to the focused element in the frame.
    async fn send_key(&self, combo: &str) -> Result<(), AutomationError>;

    /// Click the first element in the frame whose text matches.
    async fn click_text(&self, text: &str) -> Result<(), AutomationError>;

    /// PNG of the full top-level page.
    async fn screenshot_png(&self) -> Result<Vec<u8>, AutomationError>;

    /// PNG of just the RF terminal frame element.
    async fn frame_screenshot_png(&self) -> Result<Vec<u8>, AutomationError>;
}

use thiserror::Error;

/// Crate-wide error type for RF terminal automation.
///
/// The variants map to the retry policy the orchestrator applies:
/// `ConnectionLost` is fatal and must never be retried, everything else
/// is an operation-level failure the caller may retry within its bound.
#[derive(Error, Debug)]
pub enum AutomationError {
    /// The browser rendered a network-failure page. Fatal for the session.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The RF screen never acknowledged an input within the wait window.
    #[error("screen-change timeout: {0}")]
    ScreenTimeout(String),

    /// The RF screen showed error/invalid text after an action.
    #[error("ui error: {0}")]
    UiError(String),

    /// The screen after quantity entry did not match the expected flow.
    #[error("flow deviation: expected {expected}, detected {detected}")]
    FlowDeviation { expected: String, detected: String },

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Driver/browser-level failure (CDP call, JS evaluation, screenshot).
    #[error("platform error: {0}")]
    PlatformError(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

impl AutomationError {
    /// Fatal errors bypass operation-level retry entirely.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AutomationError::ConnectionLost(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_loss_is_the_only_fatal_kind() {
        assert!(AutomationError::ConnectionLost("reset".into()).is_fatal());
        assert!(!AutomationError::ScreenTimeout("no ack".into()).is_fatal());
        assert!(!AutomationError::UiError("invalid item".into()).is_fatal());
        assert!(!AutomationError::PlatformError("cdp".into()).is_fatal());
    }
}

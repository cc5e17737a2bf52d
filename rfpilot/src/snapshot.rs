//! Content snapshots of the RF terminal frame.
//!
//! The legacy terminal UI gives no request/response contract, so the only
//! way to tell that a keystroke landed is that the rendered text changed.
//! A snapshot reduces the frame's visible text to a short digest that is
//! cheap to recompute and compare on every poll tick.

use crate::drivers::TerminalDriver;
use crate::errors::AutomationError;

/// Upper bound on how much frame text feeds the digest. The RF terminal
/// renders a few hundred characters per screen; anything past the budget
/// is scroll-back noise that never changes between screens.
pub const SNAPSHOT_TEXT_BUDGET: usize = 4096;

/// A fixed-length fingerprint of a frame's visible text at one instant.
///
/// Snapshots carry no semantic meaning beyond equality comparison and are
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 12 hex chars are plenty for log lines.
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}

/// Digest visible text into a snapshot, reading at most
/// [`SNAPSHOT_TEXT_BUDGET`] characters.
pub fn digest_text(text: &str) -> Snapshot {
    let bounded: String = text.chars().take(SNAPSHOT_TEXT_BUDGET).collect();
    Snapshot(blake3::hash(bounded.as_bytes()).to_hex().to_string())
}

/// Snapshot the live RF frame through the driver.
///
/// A read failure here is not swallowed: during navigation the frame may
/// be detached or mid-replacement, and the change-wait protocol decides
/// whether that counts as "content is in flux".
pub async fn frame_snapshot(driver: &dyn TerminalDriver) -> Result<Snapshot, AutomationError> {
    let text = driver.frame_text().await?;
    Ok(digest_text(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_fixed_length_and_stable() {
        let a = digest_text("RF Menu  1. Receive  2. Load");
        let b = digest_text("RF Menu  1. Receive  2. Load");
        assert_eq!(a, b);
        assert_eq!(a.as_hex().len(), 64);
    }

    #[test]
    fn different_screens_produce_different_digests() {
        let a = digest_text("ASN: _");
        let b = digest_text("Item: _");
        assert_ne!(a, b);
    }

    #[test]
    fn text_past_the_budget_does_not_affect_the_digest() {
        let head = "x".repeat(SNAPSHOT_TEXT_BUDGET);
        let a = digest_text(&format!("{head}tail-one"));
        let b = digest_text(&format!("{head}tail-two"));
        // The differing tails sit past the budget and are never read.
        assert_eq!(a, b);
        assert_eq!(a, digest_text(&head));
    }
}

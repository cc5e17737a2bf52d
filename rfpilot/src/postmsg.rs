//! Integration-message posting.
//!
//! A mechanical sibling workflow to receive: resolve a payload string for
//! a message type, paste it into the RF integration screen, submit. The
//! payload builder itself (XML assembly, database lookups) lives behind
//! [`MessageSource`]; the core only consumes the resolved string.

use tracing::info;

use crate::errors::AutomationError;
use crate::workflow::{RfWorkflows, PAYLOAD_FIELD};

/// Menu entry and marker for the integration-message screen.
pub const POST_MESSAGE_MENU: &str = "Post Message";
pub const POST_MESSAGE_TXN_MARKER: &str = "INT";

/// Resolves an outbound message payload for a type and environment.
pub trait MessageSource: Send + Sync {
    fn resolve(&self, message_type: &str, environment: &str) -> Result<String, AutomationError>;
}

/// Post one integration message through the RF terminal.
pub async fn post_integration_message(
    rf: &RfWorkflows,
    source: &dyn MessageSource,
    message_type: &str,
    environment: &str,
) -> Result<(), AutomationError> {
    let payload = source.resolve(message_type, environment)?;
    info!(
        message_type,
        environment,
        payload_bytes = payload.len(),
        "posting integration message"
    );

    rf.navigate_to_menu_by_search(POST_MESSAGE_MENU, Some(POST_MESSAGE_TXN_MARKER))
        .await?;
    rf.primitives()
        .fill_and_submit(PAYLOAD_FIELD, &payload, "post-message")
        .await?
        .into_result()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource;

    impl MessageSource for FixedSource {
        fn resolve(&self, message_type: &str, environment: &str) -> Result<String, AutomationError> {
            if message_type == "asn" {
                Ok(format!("<asn env=\"{environment}\"/>"))
            } else {
                Err(AutomationError::ConfigError(format!(
                    "no payload for {message_type}"
                )))
            }
        }
    }

    #[test]
    fn source_resolution_is_plain_and_typed() {
        let source = FixedSource;
        assert_eq!(source.resolve("asn", "qa").unwrap(), "<asn env=\"qa\"/>");
        assert!(matches!(
            source.resolve("pix", "qa"),
            Err(AutomationError::ConfigError(_))
        ));
    }
}

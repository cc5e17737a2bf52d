//! One state handler per non-terminal receive state.
//!
//! Handlers are registered once at machine construction and are stateless
//! across runs; everything run-scoped lives in [`ReceiveContext`].

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::AutomationError;
use crate::flows::{detect_flow, FlowKind};
use crate::receive::context::ReceiveContext;
use crate::receive::state::ReceiveState;
use crate::workflow::{RfWorkflows, ScanMode, ASN_FIELD, ILPN_FIELD, ITEM_FIELD};

/// RF menu entry and transaction marker for the receive screen.
pub const RECEIVE_MENU: &str = "Receive ASN";
pub const RECEIVE_TXN_MARKER: &str = "RCV";

/// Screen phrase shown when the terminal has no putaway suggestion.
const NO_PUTAWAY_PHRASE: &str = "no putaway location";

/// Where a handler wants the machine to go next, with the reason that
/// lands in the transition log.
pub struct Advance {
    pub next: ReceiveState,
    pub reason: String,
}

impl Advance {
    pub fn to(next: ReceiveState, reason: impl Into<String>) -> Self {
        Self {
            next,
            reason: reason.into(),
        }
    }
}

/// Behavior of one non-terminal state.
///
/// `detect` re-derives whether the live screen corresponds to this
/// handler's state, used for out-of-band recovery when the machine's
/// notion of where it is has been invalidated.
#[async_trait]
pub trait StateHandler: Send + Sync {
    fn state(&self) -> ReceiveState;

    async fn execute(
        &self,
        rf: &RfWorkflows,
        ctx: &mut ReceiveContext,
    ) -> Result<Advance, AutomationError>;

    async fn detect(&self, rf: &RfWorkflows) -> Result<bool, AutomationError>;
}

/// Byte offset of `label` in `line`, ASCII-case-insensitively.
///
/// The comparison stays in byte space on purpose: `to_lowercase` can
/// change byte lengths for some Unicode, so an offset found in a
/// lowercased copy does not transfer back to the original line. A match
/// only ever covers ASCII bytes, so both ends sit on char boundaries.
fn find_label(line: &str, label: &str) -> Option<usize> {
    let haystack = line.as_bytes();
    let needle = label.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Pull the value following `label` on its line, e.g.
/// `parse_labeled_value("Putaway Location: A-01-02", "putaway location:")`.
/// Labels are ASCII; the value may be arbitrary screen text.
pub(crate) fn parse_labeled_value(text: &str, label: &str) -> Option<String> {
    for line in text.lines() {
        if let Some(idx) = find_label(line, label) {
            let rest = line[idx + label.len()..].trim();
            if !rest.is_empty() {
                // Value runs to the next double space or end of line.
                let value = rest.split("  ").next().unwrap_or(rest).trim();
                return Some(value.to_string());
            }
        }
    }
    None
}

pub(crate) fn parse_labeled_number(text: &str, label: &str) -> Option<u32> {
    parse_labeled_value(text, label).and_then(|v| v.parse().ok())
}

pub struct InitHandler;

#[async_trait]
impl StateHandler for InitHandler {
    fn state(&self) -> ReceiveState {
        ReceiveState::Init
    }

    async fn execute(
        &self,
        rf: &RfWorkflows,
        _ctx: &mut ReceiveContext,
    ) -> Result<Advance, AutomationError> {
        rf.navigate_to_menu_by_search(RECEIVE_MENU, Some(RECEIVE_TXN_MARKER))
            .await?;
        Ok(Advance::to(
            ReceiveState::Navigated,
            format!("opened '{RECEIVE_MENU}' via menu search"),
        ))
    }

    async fn detect(&self, rf: &RfWorkflows) -> Result<bool, AutomationError> {
        Ok(rf.frame_text().await?.to_lowercase().contains("menu"))
    }
}

pub struct NavigatedHandler;

#[async_trait]
impl StateHandler for NavigatedHandler {
    fn state(&self) -> ReceiveState {
        ReceiveState::Navigated
    }

    async fn execute(
        &self,
        rf: &RfWorkflows,
        ctx: &mut ReceiveContext,
    ) -> Result<Advance, AutomationError> {
        let asn = ctx.asn.clone();
        rf.scan_barcode(ASN_FIELD, &asn, ScanMode::AutoEnter)
            .await?
            .into_result()?;

        let text = rf.frame_text().await?;
        ctx.shipped_qty = parse_labeled_number(&text, "shipped qty:");
        if ctx.shipped_qty.is_none() {
            debug!("no shipped quantity shown after ASN scan");
        }
        Ok(Advance::to(
            ReceiveState::AsnScanned,
            format!("ASN {asn} accepted"),
        ))
    }

    async fn detect(&self, rf: &RfWorkflows) -> Result<bool, AutomationError> {
        Ok(rf.frame_text().await?.to_lowercase().contains("asn:"))
    }
}

pub struct AsnScannedHandler;

#[async_trait]
impl StateHandler for AsnScannedHandler {
    fn state(&self) -> ReceiveState {
        ReceiveState::AsnScanned
    }

    async fn execute(
        &self,
        rf: &RfWorkflows,
        ctx: &mut ReceiveContext,
    ) -> Result<Advance, AutomationError> {
        let item = ctx.item.clone();
        rf.scan_barcode(ITEM_FIELD, &item, ScanMode::AutoEnter)
            .await?
            .into_result()?;
        Ok(Advance::to(
            ReceiveState::ItemScanned,
            format!("item {item} accepted"),
        ))
    }

    async fn detect(&self, rf: &RfWorkflows) -> Result<bool, AutomationError> {
        Ok(rf.frame_text().await?.to_lowercase().contains("item:"))
    }
}

pub struct ItemScannedHandler;

#[async_trait]
impl StateHandler for ItemScannedHandler {
    fn state(&self) -> ReceiveState {
        ReceiveState::ItemScanned
    }

    async fn execute(
        &self,
        rf: &RfWorkflows,
        ctx: &mut ReceiveContext,
    ) -> Result<Advance, AutomationError> {
        rf.enter_quantity(ctx.quantity).await?.into_result()?;
        Ok(Advance::to(
            ReceiveState::QtyEntered,
            format!("quantity {} submitted", ctx.quantity),
        ))
    }

    async fn detect(&self, rf: &RfWorkflows) -> Result<bool, AutomationError> {
        Ok(rf.frame_text().await?.to_lowercase().contains("qty:"))
    }
}

/// The critical branch: classify which screen actually appeared after
/// quantity entry, independent of what the caller expected.
pub struct QtyEnteredHandler;

#[async_trait]
impl StateHandler for QtyEnteredHandler {
    fn state(&self) -> ReceiveState {
        ReceiveState::QtyEntered
    }

    async fn execute(
        &self,
        rf: &RfWorkflows,
        ctx: &mut ReceiveContext,
    ) -> Result<Advance, AutomationError> {
        let text = rf.frame_text().await?;
        let detected = detect_flow(&text);
        let expected = ctx.flow_hint;
        info!(%detected, %expected, "classified post-quantity screen");

        if detected == FlowKind::Unknown {
            return Err(AutomationError::FlowDeviation {
                expected: expected.as_str().into(),
                detected: detected.as_str().into(),
            });
        }

        if detected != expected && !ctx.auto_handle_deviation {
            // Fail loud on unexpected branching rather than guess.
            return Err(AutomationError::FlowDeviation {
                expected: expected.as_str().into(),
                detected: detected.as_str().into(),
            });
        }

        if detected != expected {
            warn!(%detected, %expected, "auto-handling flow deviation");
        }

        match detected {
            FlowKind::HappyPath => Ok(Advance::to(
                ReceiveState::AwaitingLocation,
                "location prompt showing",
            )),
            FlowKind::BlindIlpn => Ok(Advance::to(
                ReceiveState::AwaitingBlindIlpn,
                "blind ILPN prompt showing",
            )),
            FlowKind::QuantityAdjust => {
                rf.primitives()
                    .send_key("Enter", "accept-variance", true)
                    .await?
                    .into_result()?;
                Ok(Advance::to(
                    ReceiveState::AwaitingLocation,
                    "quantity variance accepted",
                ))
            }
            FlowKind::Unknown => unreachable!("unknown flow rejected above"),
        }
    }

    async fn detect(&self, rf: &RfWorkflows) -> Result<bool, AutomationError> {
        Ok(detect_flow(&rf.frame_text().await?) != FlowKind::Unknown)
    }
}

/// Recovery for the blind-ILPN deviation: synthesize a timestamp-derived
/// identifier and submit it into the prompt.
pub struct AwaitingBlindIlpnHandler;

impl AwaitingBlindIlpnHandler {
    fn generate_ilpn() -> String {
        format!("LP{}", chrono::Utc::now().format("%y%m%d%H%M%S"))
    }
}

#[async_trait]
impl StateHandler for AwaitingBlindIlpnHandler {
    fn state(&self) -> ReceiveState {
        ReceiveState::AwaitingBlindIlpn
    }

    async fn execute(
        &self,
        rf: &RfWorkflows,
        ctx: &mut ReceiveContext,
    ) -> Result<Advance, AutomationError> {
        let ilpn = Self::generate_ilpn();
        info!(%ilpn, "submitting generated blind ILPN");
        rf.scan_barcode(ILPN_FIELD, &ilpn, ScanMode::AutoEnter)
            .await?
            .into_result()?;
        ctx.ilpn = Some(ilpn.clone());
        Ok(Advance::to(
            ReceiveState::AwaitingLocation,
            format!("blind ILPN {ilpn} accepted"),
        ))
    }

    async fn detect(&self, rf: &RfWorkflows) -> Result<bool, AutomationError> {
        Ok(rf.frame_text().await?.to_lowercase().contains("ilpn:"))
    }
}

pub struct AwaitingLocationHandler;

#[async_trait]
impl StateHandler for AwaitingLocationHandler {
    fn state(&self) -> ReceiveState {
        ReceiveState::AwaitingLocation
    }

    async fn execute(
        &self,
        rf: &RfWorkflows,
        ctx: &mut ReceiveContext,
    ) -> Result<Advance, AutomationError> {
        let text = rf.frame_text().await?;
        if text.to_lowercase().contains(NO_PUTAWAY_PHRASE) {
            return Ok(Advance::to(
                ReceiveState::CantFindPutawayLocation,
                "terminal reported no putaway location",
            ));
        }

        let location = parse_labeled_value(&text, "putaway location:").ok_or_else(|| {
            AutomationError::UiError("location prompt showing but no location suggested".into())
        })?;
        ctx.suggested_location = Some(location.clone());

        rf.confirm_location(&location).await?;
        ctx.received_qty = Some(ctx.quantity);
        Ok(Advance::to(
            ReceiveState::Complete,
            format!("location {location} confirmed"),
        ))
    }

    async fn detect(&self, rf: &RfWorkflows) -> Result<bool, AutomationError> {
        Ok(rf
            .frame_text()
            .await?
            .to_lowercase()
            .contains("putaway location"))
    }
}

/// The terminal could not suggest a putaway location. Re-prompt a bounded
/// number of times; inventory sometimes frees a slot between prompts.
pub struct CantFindPutawayLocationHandler;

#[async_trait]
impl StateHandler for CantFindPutawayLocationHandler {
    fn state(&self) -> ReceiveState {
        ReceiveState::CantFindPutawayLocation
    }

    async fn execute(
        &self,
        rf: &RfWorkflows,
        ctx: &mut ReceiveContext,
    ) -> Result<Advance, AutomationError> {
        if ctx.retry_count >= ctx.max_retries {
            return Err(AutomationError::UiError(format!(
                "no putaway location suggested after {} attempts",
                ctx.retry_count
            )));
        }
        ctx.retry_count += 1;
        rf.primitives()
            .send_key("Enter", "reprompt-location", true)
            .await?
            .into_result()?;
        Ok(Advance::to(
            ReceiveState::AwaitingLocation,
            format!("re-prompted for location (attempt {})", ctx.retry_count),
        ))
    }

    async fn detect(&self, rf: &RfWorkflows) -> Result<bool, AutomationError> {
        Ok(rf
            .frame_text()
            .await?
            .to_lowercase()
            .contains(NO_PUTAWAY_PHRASE))
    }
}

//! RF workflow layer: named business actions composed from primitives.
//!
//! Workflows add the retry/error-propagation shape the state machine
//! relies on, plus two pieces of protocol the primitives don't know
//! about: transaction-marker verification after menu navigation, and the
//! auto-accept rules for scan banners.

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::AutomationError;
use crate::primitives::{FieldOutcome, RfPrimitives};

/// Well-known field names in the RF terminal's rendered form.
pub const MENU_SEARCH_FIELD: &str = "menu-search";
pub const ASN_FIELD: &str = "asn";
pub const ITEM_FIELD: &str = "item";
pub const QTY_FIELD: &str = "qty";
pub const LOCATION_FIELD: &str = "location";
pub const ILPN_FIELD: &str = "ilpn";
pub const PAYLOAD_FIELD: &str = "payload";

/// Deliberately-invalid test barcode. Never auto-accepted: accepting the
/// banner it provokes would mask a real test failure.
pub const INVALID_TEST_BARCODE: &str = "INVALID-TEST-SCAN";

/// How a barcode scan is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Fill only; the value is tracked so a later explicit submit can
    /// target the same field.
    Only,
    /// Fill and submit, optionally auto-accepting an info banner.
    AutoEnter,
}

/// Domain actions against the RF terminal.
pub struct RfWorkflows {
    prim: RfPrimitives,
    /// Field last filled by a `ScanMode::Only` scan, awaiting submit.
    pending_scan: Mutex<Option<String>>,
}

impl RfWorkflows {
    pub fn new(prim: RfPrimitives) -> Self {
        Self {
            prim,
            pending_scan: Mutex::new(None),
        }
    }

    pub fn primitives(&self) -> &RfPrimitives {
        &self.prim
    }

    pub async fn frame_text(&self) -> Result<String, AutomationError> {
        self.prim.frame_text().await
    }

    /// Navigate to a named RF screen through the menu search box.
    ///
    /// When `expected_txn` is supplied, the landing screen must contain
    /// it: a wrong-but-valid-looking menu shows no error keyword, so
    /// keyword classification alone cannot catch a missed click.
    pub async fn navigate_to_menu_by_search(
        &self,
        menu_name: &str,
        expected_txn: Option<&str>,
    ) -> Result<(), AutomationError> {
        info!(menu_name, "navigating via menu search");
        self.prim
            .fill_and_submit(MENU_SEARCH_FIELD, menu_name, "menu-search")
            .await?
            .into_result()?;
        self.prim
            .click_text(menu_name, "menu-open", true)
            .await?
            .into_result()?;

        if let Some(marker) = expected_txn {
            let text = self.prim.frame_text().await?;
            if !text.to_lowercase().contains(&marker.to_lowercase()) {
                return Err(AutomationError::UiError(format!(
                    "navigation to '{menu_name}' landed on a screen without expected marker '{marker}'"
                )));
            }
            debug!(marker, "transaction marker verified");
        }
        Ok(())
    }

    /// Scan a value into a barcode field.
    pub async fn scan_barcode(
        &self,
        field: &str,
        value: &str,
        mode: ScanMode,
    ) -> Result<FieldOutcome, AutomationError> {
        match mode {
            ScanMode::Only => {
                self.prim
                    .fill_only(field, value, &format!("scan-{field}"))
                    .await?;
                *self.pending_scan.lock().await = Some(field.to_string());
                Ok(FieldOutcome {
                    has_error: false,
                    message: None,
                })
            }
            ScanMode::AutoEnter => {
                let outcome = self
                    .prim
                    .fill_and_submit(field, value, &format!("scan-{field}"))
                    .await?;
                if outcome.has_error {
                    return Ok(outcome);
                }
                if let Some(message) = &outcome.message {
                    let accept = self.prim.options().auto_accept_info
                        && value != INVALID_TEST_BARCODE;
                    if accept {
                        info!(field, message = %message, "auto-accepting info banner");
                        return self.prim.send_key("Enter", "accept-banner", true).await;
                    }
                    debug!(field, message = %message, "leaving banner for the caller");
                }
                Ok(outcome)
            }
        }
    }

    /// Submit the field left pending by the last `ScanMode::Only` scan.
    pub async fn submit_pending_scan(&self) -> Result<FieldOutcome, AutomationError> {
        let field = self.pending_scan.lock().await.take().ok_or_else(|| {
            AutomationError::InvalidArgument("no pending scan to submit".into())
        })?;
        self.prim.submit(&field, &format!("submit-{field}")).await
    }

    /// Enter a receive quantity. The caller classifies the screen that
    /// follows; several divergent screens are legitimate here.
    pub async fn enter_quantity(&self, quantity: u32) -> Result<FieldOutcome, AutomationError> {
        self.prim
            .fill_and_submit(QTY_FIELD, &quantity.to_string(), "enter-quantity")
            .await
    }

    /// Confirm a putaway location.
    pub async fn confirm_location(&self, location: &str) -> Result<FieldOutcome, AutomationError> {
        self.prim
            .fill_and_submit(LOCATION_FIELD, location, "confirm-location")
            .await?
            .into_result()
    }
}

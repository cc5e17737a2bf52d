//! Session bootstrap: wires driver, guard, screenshot sink, and the RF
//! layers together for one browser page.
//!
//! Sign-on and warehouse selection are boundary-mechanical fills with no
//! branching of their own; they live here rather than in the state
//! machine.

use std::sync::Arc;

use tracing::info;

use crate::config::{EnvCredentials, RfOptions};
use crate::drivers::TerminalDriver;
use crate::errors::AutomationError;
use crate::guard::ConnectionGuard;
use crate::postmsg::{post_integration_message, MessageSource};
use crate::primitives::RfPrimitives;
use crate::receive::ReceiveStateMachine;
use crate::screenshot::ScreenshotSink;
use crate::workflow::RfWorkflows;

const USERNAME_FIELD: &str = "username";
const PASSWORD_FIELD: &str = "password";
const WAREHOUSE_FIELD: &str = "warehouse";

/// One signed-on operator session against one browser page.
///
/// Owns the guard and the workflow stack; exactly one state-machine run
/// drives the page at a time.
pub struct RfSession {
    credentials: EnvCredentials,
    guard: Arc<ConnectionGuard>,
    workflows: Arc<RfWorkflows>,
}

impl RfSession {
    pub fn bootstrap(
        credentials: EnvCredentials,
        driver: Arc<dyn TerminalDriver>,
        screenshots: Arc<dyn ScreenshotSink>,
        options: RfOptions,
    ) -> Self {
        let guard = Arc::new(ConnectionGuard::new(screenshots.clone()));
        let prim = RfPrimitives::new(driver, guard.clone(), screenshots, options);
        let workflows = Arc::new(RfWorkflows::new(prim));
        Self {
            credentials,
            guard,
            workflows,
        }
    }

    pub fn guard(&self) -> &Arc<ConnectionGuard> {
        &self.guard
    }

    pub fn workflows(&self) -> &Arc<RfWorkflows> {
        &self.workflows
    }

    /// Fill the sign-on form. Mechanical: the login screen has no
    /// branching beyond its error banner.
    pub async fn sign_on(&self) -> Result<(), AutomationError> {
        info!(username = %self.credentials.username, "signing on");
        let prim = self.workflows.primitives();
        prim.fill_only(USERNAME_FIELD, &self.credentials.username, "sign-on-user")
            .await?;
        prim.fill_and_submit(PASSWORD_FIELD, &self.credentials.password, "sign-on")
            .await?
            .into_result()?;
        Ok(())
    }

    /// Select the configured warehouse after sign-on.
    pub async fn select_warehouse(&self) -> Result<(), AutomationError> {
        info!(warehouse = %self.credentials.warehouse_code, "selecting warehouse");
        self.workflows
            .primitives()
            .fill_and_submit(
                WAREHOUSE_FIELD,
                &self.credentials.warehouse_code,
                "select-warehouse",
            )
            .await?
            .into_result()?;
        Ok(())
    }

    /// Build the receive state machine for this session.
    pub fn receive(&self) -> ReceiveStateMachine {
        ReceiveStateMachine::new(self.workflows.clone())
    }

    /// Post one integration message through this session.
    pub async fn post_message(
        &self,
        source: &dyn MessageSource,
        message_type: &str,
    ) -> Result<(), AutomationError> {
        post_integration_message(
            &self.workflows,
            source,
            message_type,
            &self.credentials.schema,
        )
        .await
    }
}

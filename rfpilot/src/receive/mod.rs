//! Receive state machine: the top-level controller for the receive
//! business process.
//!
//! The machine owns a handler registry keyed by state and drives one
//! [`ReceiveContext`] from INIT to a terminal state, branching on screen
//! classification. Transitions are only trustworthy because the
//! primitives underneath wait for the screen to acknowledge every input.

mod context;
mod handlers;
mod state;

pub use context::{ReceiveContext, ReceiveRequest, Transition};
pub use handlers::{Advance, StateHandler, RECEIVE_MENU, RECEIVE_TXN_MARKER};
pub use state::ReceiveState;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::errors::AutomationError;
use crate::flows::FlowKind;
use crate::workflow::RfWorkflows;

/// Outcome of one run: the terminal state plus the full run context for
/// post-run diagnosis without re-running.
#[derive(Debug)]
pub struct ReceiveReport {
    pub final_state: ReceiveState,
    pub context: ReceiveContext,
}

impl ReceiveReport {
    pub fn is_complete(&self) -> bool {
        self.final_state == ReceiveState::Complete
    }
}

pub struct ReceiveStateMachine {
    rf: Arc<RfWorkflows>,
    handlers: HashMap<ReceiveState, Arc<dyn StateHandler>>,
    /// Detection order for out-of-band resync, most specific screens
    /// first (the location prompt also mentions quantities, etc).
    detect_order: Vec<ReceiveState>,
}

impl ReceiveStateMachine {
    pub fn new(rf: Arc<RfWorkflows>) -> Self {
        let mut handlers: HashMap<ReceiveState, Arc<dyn StateHandler>> = HashMap::new();
        for handler in [
            Arc::new(handlers::InitHandler) as Arc<dyn StateHandler>,
            Arc::new(handlers::NavigatedHandler),
            Arc::new(handlers::AsnScannedHandler),
            Arc::new(handlers::ItemScannedHandler),
            Arc::new(handlers::QtyEnteredHandler),
            Arc::new(handlers::AwaitingBlindIlpnHandler),
            Arc::new(handlers::AwaitingLocationHandler),
            Arc::new(handlers::CantFindPutawayLocationHandler),
        ] {
            handlers.insert(handler.state(), handler);
        }

        Self {
            rf,
            handlers,
            detect_order: vec![
                ReceiveState::CantFindPutawayLocation,
                ReceiveState::AwaitingBlindIlpn,
                ReceiveState::AwaitingLocation,
                ReceiveState::QtyEntered,
                ReceiveState::ItemScanned,
                ReceiveState::AsnScanned,
                ReceiveState::Navigated,
                ReceiveState::Init,
            ],
        }
    }

    /// Drive one receive operation to a terminal state.
    ///
    /// Ordinary failures land in the report as a terminal ERROR with the
    /// underlying message; only connection loss propagates as `Err`, so
    /// the orchestrator can distinguish "retry the run" from "the
    /// session is dead".
    pub async fn run(&self, req: ReceiveRequest) -> Result<ReceiveReport, AutomationError> {
        let flow_hint = FlowKind::from_hint(&req.flow_hint);
        if flow_hint == FlowKind::Unknown {
            return Err(AutomationError::InvalidArgument(format!(
                "unrecognized flow hint: {}",
                req.flow_hint
            )));
        }

        let mut ctx = ReceiveContext::new(&req, flow_hint);
        let mut state = ReceiveState::Init;
        let mut stalls: u32 = 0;
        info!(
            run_id = %ctx.run_id,
            asn = %ctx.asn,
            item = %ctx.item,
            quantity = ctx.quantity,
            %flow_hint,
            "starting receive run"
        );

        while !state.is_terminal() {
            let handler = self
                .handlers
                .get(&state)
                .cloned()
                .ok_or_else(|| {
                    AutomationError::PlatformError(format!("no handler registered for {state}"))
                })?;

            match handler.execute(&self.rf, &mut ctx).await {
                Ok(Advance { next, reason }) => {
                    if next == state {
                        // Filtered no-op; bounded so a misbehaving
                        // handler cannot hang the run.
                        stalls += 1;
                        if stalls > ctx.max_retries {
                            let msg = format!("handler stalled in state {state}");
                            error!(run_id = %ctx.run_id, %state, "handler stalled");
                            ctx.error_message = Some(msg.clone());
                            ctx.record(state, ReceiveState::Error, msg);
                            state = ReceiveState::Error;
                        }
                        continue;
                    }
                    stalls = 0;
                    debug!(run_id = %ctx.run_id, from = %state, to = %next, %reason, "transition");
                    ctx.record(state, next, reason);
                    state = next;
                }
                Err(e) if e.is_fatal() => {
                    let msg = e.to_string();
                    ctx.error_message = Some(msg.clone());
                    ctx.record(state, ReceiveState::Aborted, msg);
                    error!(
                        run_id = %ctx.run_id,
                        %state,
                        error = %e,
                        transitions = %ctx.describe_transitions(),
                        "connection lost mid-run, aborting"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let msg = e.to_string();
                    warn!(run_id = %ctx.run_id, %state, error = %msg, "receive run failed");
                    ctx.error_message = Some(msg.clone());
                    ctx.record(state, ReceiveState::Error, msg);
                    state = ReceiveState::Error;
                }
            }
        }

        info!(
            run_id = %ctx.run_id,
            final_state = %state,
            transitions = ctx.transitions.len(),
            "receive run finished"
        );
        Ok(ReceiveReport {
            final_state: state,
            context: ctx,
        })
    }

    /// Re-derive which state the live screen corresponds to, for
    /// out-of-band recovery after the machine's position was invalidated
    /// (e.g. an operator touched the terminal between runs).
    pub async fn resync(&self) -> Result<Option<ReceiveState>, AutomationError> {
        for state in &self.detect_order {
            let handler = match self.handlers.get(state) {
                Some(h) => h.clone(),
                None => continue,
            };
            if handler.detect(&self.rf).await? {
                debug!(%state, "screen matched state");
                return Ok(Some(*state));
            }
        }
        Ok(None)
    }
}

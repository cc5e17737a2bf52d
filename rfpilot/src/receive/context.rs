//! Run-scoped data for one receive operation.

use uuid::Uuid;

use crate::flows::FlowKind;
use crate::receive::state::ReceiveState;

/// Inputs to one receive run, as supplied by the orchestrator.
#[derive(Debug, Clone)]
pub struct ReceiveRequest {
    pub asn: String,
    pub item: String,
    pub quantity: u32,
    /// Flow the caller expects after quantity entry ("HAPPY_PATH", ...).
    pub flow_hint: String,
    /// Run the automated recovery when the detected flow deviates from
    /// the hint. Off by default: fail loud rather than guess.
    pub auto_handle_deviation: bool,
}

/// One recorded state transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: ReceiveState,
    pub to: ReceiveState,
    pub reason: String,
}

/// Mutable record threaded through one receive run.
///
/// Created at the start of `run`, exclusively owned by that run, and
/// discarded at the terminal state. Never shared across runs.
#[derive(Debug)]
pub struct ReceiveContext {
    pub run_id: Uuid,

    // Identifiers
    pub asn: String,
    pub item: String,
    pub quantity: u32,

    // Screen-derived observations
    pub shipped_qty: Option<u32>,
    pub received_qty: Option<u32>,
    pub ilpn: Option<String>,
    pub suggested_location: Option<String>,

    // Flow control
    pub flow_hint: FlowKind,
    pub auto_handle_deviation: bool,

    // Failure tracking
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,

    /// Append-only log reflecting true execution order.
    pub transitions: Vec<Transition>,
}

impl ReceiveContext {
    pub fn new(req: &ReceiveRequest, flow_hint: FlowKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            asn: req.asn.clone(),
            item: req.item.clone(),
            quantity: req.quantity,
            shipped_qty: None,
            received_qty: None,
            ilpn: None,
            suggested_location: None,
            flow_hint,
            auto_handle_deviation: req.auto_handle_deviation,
            error_message: None,
            retry_count: 0,
            max_retries: 3,
            transitions: Vec::new(),
        }
    }

    /// Record a transition. Same-state entries are filtered, not logged.
    pub fn record(&mut self, from: ReceiveState, to: ReceiveState, reason: impl Into<String>) {
        if from == to {
            return;
        }
        self.transitions.push(Transition {
            from,
            to,
            reason: reason.into(),
        });
    }

    /// Render the transition log for diagnostics.
    pub fn describe_transitions(&self) -> String {
        self.transitions
            .iter()
            .map(|t| format!("{} -> {} ({})", t.from, t.to, t.reason))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReceiveRequest {
        ReceiveRequest {
            asn: "23907432".into(),
            item: "J105SXC200TR".into(),
            quantity: 1,
            flow_hint: "HAPPY_PATH".into(),
            auto_handle_deviation: false,
        }
    }

    #[test]
    fn same_state_transitions_are_filtered() {
        let mut ctx = ReceiveContext::new(&request(), FlowKind::HappyPath);
        ctx.record(ReceiveState::Init, ReceiveState::Init, "no-op");
        assert!(ctx.transitions.is_empty());

        ctx.record(ReceiveState::Init, ReceiveState::Navigated, "menu opened");
        assert_eq!(ctx.transitions.len(), 1);
        assert_eq!(ctx.transitions[0].to, ReceiveState::Navigated);
    }

    #[test]
    fn log_is_append_only_in_order() {
        let mut ctx = ReceiveContext::new(&request(), FlowKind::HappyPath);
        ctx.record(ReceiveState::Init, ReceiveState::Navigated, "a");
        ctx.record(ReceiveState::Navigated, ReceiveState::AsnScanned, "b");
        let rendered = ctx.describe_transitions();
        assert!(rendered.contains("INIT -> NAVIGATED (a)"));
        assert!(
            rendered.find("NAVIGATED -> ASN_SCANNED").unwrap()
                > rendered.find("INIT -> NAVIGATED").unwrap()
        );
    }
}

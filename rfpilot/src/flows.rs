//! Flow metadata: mapping free screen text to known receive flows.
//!
//! After quantity entry the terminal branches to one of several screens
//! depending on ASN setup the operator cannot see in advance. Each known
//! flow carries keyword triggers; detection is independent of which flow
//! was expected.

use once_cell::sync::Lazy;

/// Closed set of receive flows the machine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// Straight to the putaway-location prompt.
    HappyPath,
    /// Terminal demands a blind ILPN before putaway.
    BlindIlpn,
    /// Terminal asks to confirm a received-vs-shipped quantity variance.
    QuantityAdjust,
    /// Screen matched no known flow.
    Unknown,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::HappyPath => "HAPPY_PATH",
            FlowKind::BlindIlpn => "BLIND_ILPN",
            FlowKind::QuantityAdjust => "QUANTITY_ADJUST",
            FlowKind::Unknown => "UNKNOWN",
        }
    }

    /// Parse an operator-supplied flow hint. Unrecognized hints map to
    /// `Unknown`, which the state machine rejects up front.
    pub fn from_hint(hint: &str) -> FlowKind {
        match hint.trim().to_uppercase().as_str() {
            "HAPPY_PATH" => FlowKind::HappyPath,
            "BLIND_ILPN" => FlowKind::BlindIlpn,
            "QUANTITY_ADJUST" => FlowKind::QuantityAdjust,
            _ => FlowKind::Unknown,
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one known flow and the screen-text fragments
/// that identify it.
pub struct FlowMetadata {
    pub kind: FlowKind,
    pub description: &'static str,
    pub triggers: &'static [&'static str],
}

/// Lookup order matters: the blind-ILPN and quantity screens also mention
/// quantities and locations further down, so the more specific flows are
/// checked first.
static FLOW_TABLE: Lazy<Vec<FlowMetadata>> = Lazy::new(|| {
    vec![
        FlowMetadata {
            kind: FlowKind::BlindIlpn,
            description: "terminal prompts for a blind ILPN before putaway",
            triggers: &["blind ilpn", "enter ilpn", "ilpn:"],
        },
        FlowMetadata {
            kind: FlowKind::QuantityAdjust,
            description: "terminal asks to confirm a quantity variance",
            triggers: &["quantity variance", "qty adjust", "adjust quantity", "differs from shipped"],
        },
        FlowMetadata {
            kind: FlowKind::HappyPath,
            description: "terminal suggests a putaway location",
            triggers: &["putaway location", "confirm location"],
        },
    ]
});

pub fn metadata_for(kind: FlowKind) -> Option<&'static FlowMetadata> {
    FLOW_TABLE.iter().find(|m| m.kind == kind)
}

/// Classify the screen showing after quantity entry into a known flow,
/// falling back to `Unknown`.
pub fn detect_flow(text: &str) -> FlowKind {
    let lower = text.to_lowercase();
    for meta in FLOW_TABLE.iter() {
        if meta.triggers.iter().any(|t| lower.contains(t)) {
            return meta.kind;
        }
    }
    FlowKind::Unknown
}

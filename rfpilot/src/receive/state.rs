/// Closed set of states for one receive run.
///
/// Exactly one state is current at any time; the terminal states are
/// mutually exclusive with further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiveState {
    Init,
    Navigated,
    AsnScanned,
    ItemScanned,
    QtyEntered,
    AwaitingLocation,
    AwaitingBlindIlpn,
    CantFindPutawayLocation,
    Complete,
    Error,
    /// Run cut short by a session-fatal failure (connection loss). The
    /// failure itself propagates as `Err` from `run`; this state marks
    /// the end of the transition log emitted for diagnostics.
    Aborted,
}

impl ReceiveState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReceiveState::Complete | ReceiveState::Error | ReceiveState::Aborted
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiveState::Init => "INIT",
            ReceiveState::Navigated => "NAVIGATED",
            ReceiveState::AsnScanned => "ASN_SCANNED",
            ReceiveState::ItemScanned => "ITEM_SCANNED",
            ReceiveState::QtyEntered => "QTY_ENTERED",
            ReceiveState::AwaitingLocation => "AWAITING_LOCATION",
            ReceiveState::AwaitingBlindIlpn => "AWAITING_BLIND_ILPN",
            ReceiveState::CantFindPutawayLocation => "CANT_FIND_PUTAWAY_LOCATION",
            ReceiveState::Complete => "COMPLETE",
            ReceiveState::Error => "ERROR",
            ReceiveState::Aborted => "ABORTED",
        }
    }
}

impl std::fmt::Display for ReceiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_three_end_states_are_terminal() {
        assert!(ReceiveState::Complete.is_terminal());
        assert!(ReceiveState::Error.is_terminal());
        assert!(ReceiveState::Aborted.is_terminal());
        assert!(!ReceiveState::Init.is_terminal());
        assert!(!ReceiveState::QtyEntered.is_terminal());
        assert!(!ReceiveState::CantFindPutawayLocation.is_terminal());
    }
}

//! Scripted operator workflows for a legacy RF warehouse terminal
//! rendered inside a browser page.
//!
//! The terminal gives no structured completion signals: no
//! request/response contract, no reliable DOM events. The only
//! observable truth is rendered text, which changes asynchronously after
//! each simulated keystroke. This crate layers a synchronization
//! protocol over that reality:
//!
//! - [`snapshot`] digests the frame's visible text for cheap comparison,
//! - [`wait`] polls the digest until the screen acknowledges an input,
//! - [`guard`] distinguishes a legitimate screen change from the browser
//!   silently rendering a network-error page,
//! - [`primitives`] and [`workflow`] build atomic and domain-level RF
//!   actions on top,
//! - [`receive`] drives the receive business process as an explicit
//!   state machine branching on screen classification.

pub mod classify;
pub mod config;
pub mod drivers;
pub mod errors;
pub mod flows;
pub mod guard;
pub mod orchestrator;
pub mod postmsg;
pub mod primitives;
pub mod receive;
pub mod screenshot;
pub mod session;
pub mod snapshot;
pub mod wait;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use classify::{classify_screen, classify_with_message, ScreenClass};
pub use config::{CredentialStore, EnvCredentials, LogConfig, RfOptions};
pub use drivers::{ChromeConfig, ChromeTerminal, TerminalDriver};
pub use errors::AutomationError;
pub use flows::{detect_flow, FlowKind, FlowMetadata};
pub use guard::ConnectionGuard;
pub use orchestrator::{run_with_retry, RetryPolicy};
pub use primitives::{FieldOutcome, RfPrimitives};
pub use receive::{
    ReceiveContext, ReceiveReport, ReceiveRequest, ReceiveState, ReceiveStateMachine,
};
pub use screenshot::{FileScreenshotSink, NullScreenshotSink, ScreenshotSink};
pub use session::RfSession;
pub use snapshot::{digest_text, frame_snapshot, Snapshot};
pub use wait::{wait_for_change, WaitConfig};
pub use workflow::{RfWorkflows, ScanMode, INVALID_TEST_BARCODE};
